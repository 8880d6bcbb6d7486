#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("could not parse date {input:?}: {reason}")]
    DateParse { input: String, reason: String },
    #[error("could not parse gestational age {0:?}")]
    GaParse(String),
    #[error("gestational age of {weeks} weeks is outside the valid range (5-42 weeks)")]
    GaOutOfRange { weeks: i64 },
    #[error("negative gestational age ({0} days)")]
    NegativeGa(i64),
    #[error("no usable gestational age reference (reliable DUM or ultrasound)")]
    NoUsableReference,
    #[error("ideal date could not be projected")]
    NoIdealDate,
    #[error("duplicate capacity entry for facility {0:?}")]
    DuplicateFacility(String),
    #[error("store query failed: {0}")]
    Store(String),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("translation error: {0}")]
    Translation(String),
}

impl ScheduleError {
    /// Whether the failure came from an external store and the record may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScheduleError::Store(_))
    }
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
