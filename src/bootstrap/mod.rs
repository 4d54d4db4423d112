use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::database::DatabaseError;

/// SQL files executed in order during bootstrap. Later scripts may depend on
/// objects created by earlier ones, so the order is load-bearing.
pub const DEFAULT_SCRIPT_FILES: &[&str] =
    &["00-complete-setup.sql", "07-create-discount-codes-table.sql"];

/// Functions the setup scripts are expected to create
pub const REQUIRED_FUNCTIONS: &[&str] = &[
    "update_updated_at_column",
    "get_user_stats",
    "get_revenue_stats",
    "add_user_credits",
    "deduct_user_credits",
    "upgrade_user_to_pro",
    "validate_discount_code",
    "increment_discount_usage",
    "get_discount_stats",
];

/// Errors from the bootstrap sequence. Only these abort the run; everything
/// else is downgraded to a warning.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Database connection failed: {0}")]
    Connectivity(#[source] sqlx::Error),

    #[error("Failed to read {script}: {source}")]
    Io {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error executing {script}: {source}")]
    Script {
        script: String,
        #[source]
        source: sqlx::Error,
    },
}

impl From<DatabaseError> for SetupError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(name) => SetupError::ConfigMissing(name),
            DatabaseError::InvalidDatabaseUrl => SetupError::InvalidDatabaseUrl,
            DatabaseError::Sqlx(e) => SetupError::Connectivity(e),
        }
    }
}

/// One SQL script in the bootstrap sequence
#[derive(Debug, Clone)]
pub struct BootstrapScript {
    pub name: String,
    pub path: PathBuf,
}

impl BootstrapScript {
    pub fn new(sql_dir: &Path, file_name: &str) -> Self {
        Self {
            name: file_name.to_string(),
            path: sql_dir.join(file_name),
        }
    }
}

/// The fixed script sequence rooted at a SQL directory
pub fn default_scripts(sql_dir: &Path) -> Vec<BootstrapScript> {
    DEFAULT_SCRIPT_FILES
        .iter()
        .map(|name| BootstrapScript::new(sql_dir, name))
        .collect()
}

/// Classification policy for database errors that are safe to ignore on
/// re-run. Held as data so the policy is configuration, not conditionals.
#[derive(Debug, Clone)]
pub struct RecoverableErrors {
    pub codes: Vec<String>,
    pub message_fragments: Vec<String>,
}

impl Default for RecoverableErrors {
    fn default() -> Self {
        Self {
            // 42P07 duplicate_table, 42710 duplicate_object
            codes: vec!["42P07".to_string(), "42710".to_string()],
            message_fragments: vec!["already exists".to_string(), "duplicate key".to_string()],
        }
    }
}

impl RecoverableErrors {
    pub fn is_recoverable(&self, code: Option<&str>, message: &str) -> bool {
        if let Some(code) = code {
            if self.codes.iter().any(|c| c == code) {
                return true;
            }
        }
        self.message_fragments.iter().any(|f| message.contains(f))
    }

    fn classify_sqlx(&self, err: &sqlx::Error) -> bool {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.to_string());
        self.is_recoverable(code.as_deref(), &err.to_string())
    }
}

/// Execution seam for one statement batch. The pool is the production
/// implementation; sequencing is driven through this trait so the
/// continue/abort behavior is observable without a live database.
#[async_trait]
pub trait ScriptExecutor: Sync {
    async fn execute_batch(&self, sql: &str) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl ScriptExecutor for PgPool {
    async fn execute_batch(&self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(sql).execute(self).await.map(|_| ())
    }
}

/// Per-script result. A fatal failure is the `Err` arm of the run instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Succeeded,
    /// Script failed with a recoverable duplicate/already-exists error
    AlreadyExists,
    /// Script file not present on disk
    SkippedMissing,
}

#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub name: String,
    pub outcome: ScriptOutcome,
}

/// Connectivity check result
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub version: String,
    pub time: DateTime<Utc>,
}

/// Post-setup verification findings. Informational only.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub users_table: bool,
    pub discount_codes_table: bool,
    pub functions_found: i64,
}

/// Sequential, one-shot executor for the bootstrap script list.
///
/// Runs strictly in order: connection check, then each script, then a
/// non-fatal verification pass. The caller owns pool release.
pub struct BootstrapRunner {
    pool: PgPool,
    recoverable: RecoverableErrors,
}

impl BootstrapRunner {
    pub fn new(pool: PgPool) -> Self {
        Self::with_recoverable(pool, RecoverableErrors::default())
    }

    pub fn with_recoverable(pool: PgPool, recoverable: RecoverableErrors) -> Self {
        Self { pool, recoverable }
    }

    /// Trivial round-trip query confirming the database is reachable.
    /// Failure here is fatal; no script runs after it.
    pub async fn check_connection(&self) -> Result<ServerInfo, SetupError> {
        let row = sqlx::query("SELECT NOW() as current_time, version() as pg_version")
            .fetch_one(&self.pool)
            .await
            .map_err(SetupError::Connectivity)?;

        let info = ServerInfo {
            version: row.get("pg_version"),
            time: row.get("current_time"),
        };
        info!("Database connection ok: {}", info.version);
        Ok(info)
    }

    /// Execute the scripts in order. A missing file or a recoverable
    /// duplicate error advances to the next script; any other database
    /// error aborts the remaining sequence.
    pub async fn run_scripts(
        &self,
        scripts: &[BootstrapScript],
    ) -> Result<Vec<ScriptReport>, SetupError> {
        run_scripts_on(&self.pool, &self.recoverable, scripts).await
    }

    /// Check that the expected tables and functions exist. Query failures
    /// are downgraded to warnings; verification never changes the exit
    /// status of the run.
    pub async fn verify(&self) -> Option<VerifyReport> {
        match self.try_verify().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Verification check failed: {}", e);
                None
            }
        }
    }

    async fn try_verify(&self) -> Result<VerifyReport, sqlx::Error> {
        let users_table = self.table_exists("users").await?;
        let discount_codes_table = self.table_exists("discount_codes").await?;

        let required: Vec<String> = REQUIRED_FUNCTIONS.iter().map(|s| s.to_string()).collect();
        let functions_found: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM pg_proc p
            JOIN pg_namespace n ON p.pronamespace = n.oid
            WHERE n.nspname = 'public'
            AND p.proname = ANY($1)
            "#,
        )
        .bind(required)
        .fetch_one(&self.pool)
        .await?;

        Ok(VerifyReport {
            users_table,
            discount_codes_table,
            functions_found,
        })
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = $1
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(&self.pool)
        .await
    }

    /// Release the pool. Called exactly once, on success and abort alike.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

async fn run_scripts_on<E: ScriptExecutor>(
    executor: &E,
    recoverable: &RecoverableErrors,
    scripts: &[BootstrapScript],
) -> Result<Vec<ScriptReport>, SetupError> {
    let mut reports = Vec::with_capacity(scripts.len());

    for script in scripts {
        let Some(sql) = load_script(script)? else {
            warn!("Script {} not found, skipping", script.name);
            reports.push(ScriptReport {
                name: script.name.clone(),
                outcome: ScriptOutcome::SkippedMissing,
            });
            continue;
        };

        info!("Executing {}", script.name);
        // Whole file as one statement batch; scripts are opaque here
        let outcome = match executor.execute_batch(&sql).await {
            Ok(_) => ScriptOutcome::Succeeded,
            Err(e) if recoverable.classify_sqlx(&e) => {
                warn!("{}: {} (object already exists, continuing)", script.name, e);
                ScriptOutcome::AlreadyExists
            }
            Err(e) => {
                return Err(SetupError::Script {
                    script: script.name.clone(),
                    source: e,
                });
            }
        };

        reports.push(ScriptReport {
            name: script.name.clone(),
            outcome,
        });
    }

    Ok(reports)
}

/// Read a script from disk; `None` when the file does not exist (a skip,
/// not a failure). Other IO errors are fatal.
fn load_script(script: &BootstrapScript) -> Result<Option<String>, SetupError> {
    if !script.path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&script.path)
        .map(Some)
        .map_err(|e| SetupError::Io {
            script: script.name.clone(),
            source: e,
        })
}
