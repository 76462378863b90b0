pub mod memory;
pub mod sqlx_repo;

pub use memory::InMemoryUsersRepository;
pub use sqlx_repo::SqlxUsersRepository;
