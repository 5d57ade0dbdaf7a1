// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory_team_repository;
pub mod memory_user_repository;
pub mod postgres_team_repository;
pub mod postgres_user_repository;

pub use memory_team_repository::InMemoryTeamRepository;
pub use memory_user_repository::InMemoryUserRepository;
pub use postgres_team_repository::PostgresTeamRepository;
pub use postgres_user_repository::PostgresUserRepository;
