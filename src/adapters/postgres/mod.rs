//! PostgreSQL adapters - Database implementations for repository ports.

mod task_repository;

pub use task_repository::PostgresTaskRepository;
