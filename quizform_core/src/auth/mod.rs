pub mod jwt;
pub mod models;
pub mod repository;
pub mod service;


pub use jwt::JwtService;
pub use models::*;
pub use repository::{UserRepository, UserRepositoryTrait};
pub use service::AuthService;
