pub mod role;
pub mod user;

pub use role::{Role, UserRole};
pub use user::{NewUser, User};
