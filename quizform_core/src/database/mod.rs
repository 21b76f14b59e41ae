pub mod connection;
pub mod migrations;
pub mod models;
pub mod repository;

pub use connection::{get_database_pool, get_memory_pool, DatabaseManager, DatabaseStats, MEMORY_DATABASE_URL};
pub use migrations::{run_migrations, MigrationManager};
pub use models::{format_timestamp, parse_timestamp};
pub use repository::{
    InteractionRepository, ResponseRepository, ResponseRepositoryTrait, TemplateRepository,
    TemplateRepositoryTrait, TemplateStats,
};
