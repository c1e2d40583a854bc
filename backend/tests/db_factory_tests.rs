//! Tests for db::factory and db::repo_config: backend selection and creation.

mod support;

use std::io::Write;
use std::str::FromStr;

use gym_access::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use gym_access::db::repository::{
    BookingRepository, RepositoryError, SessionRepository, SettingsRepository,
};
use gym_access::db::RepositoryConfig;

#[test]
fn test_repository_type_from_str() {
    for raw in ["postgres", "POSTGRES", "postgresql", " pg "] {
        assert_eq!(RepositoryType::from_str(raw).unwrap(), RepositoryType::Postgres);
    }
    for raw in ["local", "LOCAL", "memory"] {
        assert_eq!(RepositoryType::from_str(raw).unwrap(), RepositoryType::Local);
    }
    let err = RepositoryType::from_str("sqlite").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/gym")),
        ],
        || assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Postgres),
    );
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/gym")),
        ],
        || assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Postgres),
    );
}

#[test]
fn test_explicit_type_wins_over_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/gym")),
        ],
        || assert_eq!(RepositoryType::from_env().unwrap(), RepositoryType::Local),
    );
}

#[test]
fn test_invalid_type_is_configuration_error() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("postgress"))], || {
        let err = RepositoryType::from_env().unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
        assert!(err.to_string().contains("postgress"));

        let built = RepositoryBuilder::new().from_env();
        assert!(matches!(
            built,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    });
}

#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(repo.list_sessions().await.unwrap().is_empty());
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    assert!(err.to_string().contains("requires PostgresConfig"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let err = RepositoryFactory::create(RepositoryType::Postgres, None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    assert!(err.to_string().contains("feature not enabled"));
}

#[tokio::test]
async fn test_builder_defaults_to_local() {
    let builder = RepositoryBuilder::new();
    assert_eq!(builder.selected_type(), RepositoryType::Local);
    let repo = builder.build().await.unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"memory\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path())
        .await
        .unwrap();
    assert_eq!(
        repo.get_gym_settings().await.unwrap(),
        gym_access::models::GymSettings::default()
    );
}

#[tokio::test]
async fn test_from_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = RepositoryFactory::from_config_file(dir.path().join("repository.toml"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_config_parse_postgres_settings() {
    let config = RepositoryConfig::parse(
        r#"
[repository]
type = "postgres"

[postgres]
database_url = "postgres://gym:gym@db:5432/gym"
max_connections = 4
"#,
    )
    .unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::Postgres);
    assert_eq!(config.postgres.max_connections, 4);
    assert_eq!(config.postgres.min_connections, 1);

    let builder = RepositoryBuilder::new().from_config(&config);
    if cfg!(feature = "postgres-repo") {
        let builder = builder.unwrap();
        assert_eq!(builder.selected_type(), RepositoryType::Postgres);
    } else {
        assert!(builder.is_err());
    }
}

#[test]
fn test_config_parse_errors() {
    assert!(matches!(
        RepositoryConfig::parse("repository = 3"),
        Err(RepositoryError::ConfigurationError { .. })
    ));
    assert!(RepositoryConfig::parse("[postgres]\nmax_connections = 2\n").is_err());
}
