pub mod id;
pub mod query;
pub mod session;
pub mod user;

pub use id::Id;
pub use query::{Pagination, SortOrder, UserFilter, UserSort, UserSortField};
pub use session::{NewSession, Session, SessionChanges};
pub use user::{NewUser, RoleId, StatusId, User, UserChanges};
