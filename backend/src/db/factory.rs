//! Repository factory.
//!
//! Picks the storage backend at startup from the environment, from a
//! `repository.toml` file, or from an explicit [`RepositoryBuilder`].

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `REPOSITORY_TYPE`, falling back to Postgres when a database URL
    /// is present and Local otherwise.
    ///
    /// An unrecognised `REPOSITORY_TYPE` is a configuration error, never a
    /// silent switch to the in-memory store.
    pub fn from_env() -> RepositoryResult<Self> {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val
                .parse()
                .map_err(|e: String| RepositoryError::configuration(format!("REPOSITORY_TYPE: {}", e)));
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Ok(Self::Postgres)
        } else {
            Ok(Self::Local)
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
fn postgres_disabled<T>() -> RepositoryResult<T> {
    Err(RepositoryError::configuration(
        "Postgres repository feature not enabled",
    ))
}

/// Creates repository instances behind `Arc<dyn FullRepository>`.
///
/// # Example
/// ```
/// use gym_access::db::RepositoryFactory;
///
/// let repo = RepositoryFactory::create_local();
/// assert_eq!(std::sync::Arc::strong_count(&repo), 1);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the given type.
    ///
    /// `postgres_config` is required for [`RepositoryType::Postgres`].
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = postgres_config.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Postgres repository requires PostgresConfig",
                        )
                    })?;
                    let pg = Self::create_postgres(config).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    let _ = postgres_config;
                    postgres_disabled()
                }
            }
        }
    }

    /// Create a Postgres repository and run its migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Create an empty in-memory repository with default settings.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a repository from environment variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new().from_env()?.build().await
    }

    /// Create a repository from a `repository.toml` file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryBuilder::new()
            .from_config(&RepositoryConfig::from_file(config_path)?)?
            .build()
            .await
    }

    /// Use `repository.toml` from a standard location when one exists,
    /// otherwise fall back to the environment.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryConfig::find_default() {
            Some(path) => Self::from_config_file(path).await,
            None => Self::from_env().await,
        }
    }
}

/// Fluent configuration for repository creation.
///
/// ```
/// use gym_access::db::{RepositoryBuilder, RepositoryType};
///
/// let builder = RepositoryBuilder::new().repository_type(RepositoryType::Local);
/// assert_eq!(builder.selected_type(), RepositoryType::Local);
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    #[cfg(feature = "postgres-repo")]
    postgres_config: Option<PostgresConfig>,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::Local,
            #[cfg(feature = "postgres-repo")]
            postgres_config: None,
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    pub fn selected_type(&self) -> RepositoryType {
        self.repo_type
    }

    #[cfg(feature = "postgres-repo")]
    pub fn postgres_config(mut self, config: PostgresConfig) -> Self {
        self.postgres_config = Some(config);
        self
    }

    /// Load the backend choice and Postgres settings from the environment.
    pub fn from_env(mut self) -> RepositoryResult<Self> {
        self.repo_type = RepositoryType::from_env()?;
        if self.repo_type == RepositoryType::Postgres {
            #[cfg(feature = "postgres-repo")]
            {
                let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
                self.postgres_config = Some(config);
            }
            #[cfg(not(feature = "postgres-repo"))]
            {
                return postgres_disabled();
            }
        }
        Ok(self)
    }

    /// Load the backend choice and Postgres settings from a parsed config file.
    pub fn from_config(mut self, config: &RepositoryConfig) -> RepositoryResult<Self> {
        self.repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        if self.repo_type == RepositoryType::Postgres {
            #[cfg(feature = "postgres-repo")]
            {
                let pg = config.to_postgres_config()?.ok_or_else(|| {
                    RepositoryError::configuration(
                        "Postgres repository requires database configuration",
                    )
                })?;
                self.postgres_config = Some(pg);
            }
            #[cfg(not(feature = "postgres-repo"))]
            {
                return postgres_disabled();
            }
        }
        Ok(self)
    }

    pub async fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        #[cfg(feature = "postgres-repo")]
        let pg_config = self.postgres_config.as_ref();
        #[cfg(not(feature = "postgres-repo"))]
        let pg_config = None;

        RepositoryFactory::create(self.repo_type, pg_config).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
