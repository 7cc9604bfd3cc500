pub mod memory;
pub mod postgres;
pub mod redis;
pub mod repository;

pub use memory::{InMemoryMatchStore, InMemoryProfileStore};
pub use postgres::{create_pool, run_migrations, PgMatchStore, PgProfileStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use repository::{MatchStore, ProfileStore};

#[cfg(test)]
pub use repository::{MockMatchStore, MockProfileStore};
