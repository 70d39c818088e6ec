pub mod prelude;

pub mod sessions;
pub mod users;
