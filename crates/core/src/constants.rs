//! Shared constants for aedelore-migrate.
//!
//! Defaults for every knob the CLI exposes live here so the service and the
//! binary agree on them.

/// Default location of the Aedelore SQLite database.
pub const DEFAULT_SQLITE_PATH: &str = "/opt/aedelore/api/data/aedelore.db";

/// Default PostgreSQL URL for the direct backend.
pub const DEFAULT_DATABASE_URL: &str = "postgres://aedelore@localhost:5432/aedelore";

/// Default container running PostgreSQL for the container backend.
pub const DEFAULT_CONTAINER: &str = "aedelore-proffs-db";

/// Default PostgreSQL role used by `pg_isready` and `psql`.
pub const DEFAULT_DB_USER: &str = "aedelore";

/// Default target database name.
pub const DEFAULT_DB_NAME: &str = "aedelore";

/// Default container management program.
pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Readiness probe: number of attempts before giving up.
pub const READY_ATTEMPTS: u32 = 30;

/// Readiness probe: pause between attempts in milliseconds.
pub const READY_INTERVAL_MS: u64 = 1000;

/// Env var overriding [`READY_ATTEMPTS`].
pub const ENV_READY_ATTEMPTS: &str = "AEDELORE_MIGRATE_READY_ATTEMPTS";

/// Env var overriding [`READY_INTERVAL_MS`].
pub const ENV_READY_INTERVAL_MS: &str = "AEDELORE_MIGRATE_READY_INTERVAL_MS";

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 2;

/// PostgreSQL connection pool: acquire timeout in seconds.
/// Kept short so a single readiness probe does not outlast the poll interval by much.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 2;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Status written for sessions that have none in the source.
pub const DEFAULT_SESSION_STATUS: &str = "active";
