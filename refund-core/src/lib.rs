pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{RefundRepository, RepositoryError};
pub use models::*;
