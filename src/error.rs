use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("{field} must be an ISO date YYYY-MM-DD")]
    MalformedDate { field: String },

    #[error("{field} is not a valid calendar date")]
    InvalidCalendarDate { field: String },

    #[error("mode must be 'actual' or 'projected' (got '{0}')")]
    UnsupportedMode(String),

    #[error("step_days must be an integer (got '{0}')")]
    StepDaysNotInteger(String),

    #[error("step_days must be {min}..{max} (got {value})")]
    StepDaysOutOfRange { value: i64, min: u32, max: u32 },

    #[error("to_date must be >= from_date ({from} > {to})")]
    InvalidRange { from: String, to: String },

    #[error("include_interest is only supported for mode=projected")]
    InterestRequiresProjected,

    #[error("requested series is too long: {points} points exceeds max_points {max_points}")]
    SeriesTooLong { points: usize, max_points: usize },

    #[error("balance of account '{account}' leaves the representable range on {date}")]
    InterestOverflow { account: String, date: NaiveDate },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Validation failed for {entity}: {details}")]
    ValidationError { entity: String, details: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProjectionError {
    /// True for errors caused by the caller's input rather than by the
    /// storage layer or the environment.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            ProjectionError::Storage(_)
                | ProjectionError::SerializationError(_)
                | ProjectionError::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
