pub mod password;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, LoginInput, LoginOutcome, RefreshOutcome, RegisterInput,
};
pub use auth_service_impl::DefaultAuthService;

pub mod session_service;
pub mod session_service_impl;
pub use session_service::{SessionError, SessionService};
pub use session_service_impl::DefaultSessionService;
