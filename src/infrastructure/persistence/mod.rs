pub mod repositories;
mod sqlite_pool;

pub use repositories::{SqliteArtifactRepository, SqliteEpisodeRepository, SqliteJobRepository};
pub use sqlite_pool::{create_pool, run_migrations};
