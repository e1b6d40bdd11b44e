use thiserror::Error;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("rule {rule_id} is invalid: {reason}")]
    RuleValidation { rule_id: i32, reason: String },

    #[error("already materialized: {0}")]
    PersistenceConflict(String),

    #[error("content generation failed: {0}")]
    ContentGeneration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("brand {0} not found")]
    BrandNotFound(i32),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("malformed stored value: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScheduleError {
    pub fn rule(rule_id: i32, reason: impl Into<String>) -> Self {
        Self::RuleValidation {
            rule_id,
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag, used in batch error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTimezone(_) => "invalid_timezone",
            Self::RuleValidation { .. } => "rule_validation",
            Self::PersistenceConflict(_) => "persistence_conflict",
            Self::ContentGeneration(_) => "content_generation",
            Self::InvalidRequest(_) => "invalid_request",
            Self::BrandNotFound(_) => "brand_not_found",
            Self::NotFound(_) => "not_found",
            Self::Database(_) => "database",
            Self::Pool(_) => "pool",
            Self::Serialization(_) => "serialization",
        }
    }

    /// True for a unique-index violation, which the materializer treats as
    /// "already exists".
    pub fn is_unique_violation(&self) -> bool {
        use diesel::result::{DatabaseErrorKind, Error};
        matches!(
            self,
            Self::Database(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }
}
