//! Error types for repository operations.
//!
//! Every storage backend reports failures through [`RepositoryError`], which
//! carries an [`ErrorContext`] describing the operation and entity involved.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "insert_booking_guarded")
    pub operation: Option<String>,
    /// The entity type involved (e.g., "booking", "session")
    pub entity: Option<String>,
    /// The entity ID if applicable
    pub entity_id: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.entity.is_none()
            && self.entity_id.is_none()
            && self.details.is_none()
            && !self.retryable
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, " [{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Connection pool or database connection errors.
    /// These are typically transient and may be retried.
    #[error("Connection error: {message}{context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// SQL query execution errors.
    #[error("Query error: {message}{context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message}{context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Data validation failed before or after database operation.
    #[error("Data validation error: {message}{context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// A uniqueness or referential rule of the store was violated.
    #[error("Conflict: {message}{context}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message}{context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message}{context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },

    /// Transaction error (commit/rollback failed).
    #[error("Transaction error: {message}{context}")]
    TransactionError {
        message: String,
        context: ErrorContext,
    },

    /// Timeout waiting for connection or query.
    #[error("Timeout error: {message}{context}")]
    TimeoutError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn connection_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn query_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::QueryError {
            message: message.into(),
            context,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn conflict_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Conflict {
            message: message.into(),
            context,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn timeout_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::TimeoutError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError { context, .. }
            | Self::TimeoutError { context, .. }
            | Self::QueryError { context, .. }
            | Self::TransactionError { context, .. } => context.retryable,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Message without the context suffix, suitable for API clients.
    pub fn message(&self) -> &str {
        match self {
            Self::ConnectionError { message, .. }
            | Self::QueryError { message, .. }
            | Self::NotFound { message, .. }
            | Self::ValidationError { message, .. }
            | Self::Conflict { message, .. }
            | Self::ConfigurationError { message, .. }
            | Self::InternalError { message, .. }
            | Self::TransactionError { message, .. }
            | Self::TimeoutError { message, .. } => message,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::Conflict { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::TimeoutError { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::Conflict { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::InternalError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::TimeoutError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::result::Error> for RepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::DatabaseErrorKind;

        match err {
            diesel::result::Error::NotFound => RepositoryError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                let context =
                    ErrorContext::default().with_details(format!("db_error_kind={:?}", kind));

                match kind {
                    DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::ForeignKeyViolation => {
                        RepositoryError::Conflict { message, context }
                    }
                    // Concurrent guarded writes lose the race with a serialization failure
                    DatabaseErrorKind::SerializationFailure => RepositoryError::QueryError {
                        message,
                        context: context.retryable(),
                    },
                    _ => RepositoryError::QueryError { message, context },
                }
            }
            diesel::result::Error::RollbackTransaction => {
                RepositoryError::transaction("Transaction rolled back")
            }
            e @ (diesel::result::Error::RollbackErrorOnCommit { .. }
            | diesel::result::Error::AlreadyInTransaction
            | diesel::result::Error::NotInTransaction
            | diesel::result::Error::BrokenTransactionManager) => {
                RepositoryError::transaction(e.to_string())
            }
            diesel::result::Error::QueryBuilderError(e) => {
                RepositoryError::query(format!("Query builder error: {}", e))
            }
            diesel::result::Error::DeserializationError(e) => {
                RepositoryError::internal(format!("Deserialization error: {}", e))
            }
            diesel::result::Error::SerializationError(e) => {
                RepositoryError::internal(format!("Serialization error: {}", e))
            }
            other => RepositoryError::query(other.to_string()),
        }
    }
}

#[cfg(feature = "postgres-repo")]
impl From<diesel::r2d2::PoolError> for RepositoryError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepositoryError::connection_with_context(
            err.to_string(),
            ErrorContext::default().with_details("pool_error"),
        )
    }
}
