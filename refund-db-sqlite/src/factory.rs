use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use refund_core::db::repository::{RefundRepository, RepositoryError};
use refund_core::db::{DbConfig, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`REFUND_DB_SQLITE_SEEDS_DIR`** — if set, use this path (override for
///    packagers or custom layouts).
/// 2. **`./seeds`** — if the directory exists in the current working directory.
/// 3. **Crate manifest dir** — `$CARGO_MANIFEST_DIR/seeds` as last resort
///    (dev/tests when run from the build tree).
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REFUND_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Translate a bare connection string into a sqlx SQLite URL.
///
/// * `":memory:"` — an ephemeral in-memory database.
/// * Anything else — a file path, created on first open.
pub fn database_url(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        "sqlite::memory:".to_string()
    } else if connection_string.starts_with("sqlite:") {
        connection_string.to_string()
    } else {
        format!("sqlite:{connection_string}?mode=rwc")
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`refund_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use refund_core::db::RepositoryRegistry;
/// use refund_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, run
    /// migrations, and apply seed data.
    ///
    /// Seed SQL files are loaded from a directory resolved at runtime (see
    /// [`seeds_dir`]); they use `INSERT OR IGNORE`, so an already-seeded
    /// database is left untouched. For packaged distribution, set
    /// `REFUND_DB_SQLITE_SEEDS_DIR` or run with a `seeds` directory in the
    /// current working directory.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn RefundRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);
        debug!(url = %url, "opening sqlite database");

        let repo = SqliteRepository::new(&url).await?;
        repo.run_migrations().await?;

        let seeds = seeds_dir();
        if seeds.is_dir() {
            repo.run_seeds(&seeds).await?;
        }

        Ok(Box::new(repo))
    }
}
