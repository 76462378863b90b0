pub mod client;
pub mod error;
pub mod model;

pub use model::{NewUser, UserInfo, UserPage, UserRecord};
