//! Error types for topic lifecycle operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopicError {
    /// A sub-topic key was not found in the owning topic's registry.
    ///
    /// Raised both when activating a new sub-topic and when rehydrating a
    /// persisted one whose factory has since been renamed or removed.
    #[error("Unknown sub-topic key: {0}")]
    UnknownSubTopic(String),

    /// Topic state could not be serialized or deserialized.
    #[error("Topic state error: {0}")]
    State(#[from] serde_json::Error),
}

pub type TopicResult<T> = Result<T, TopicError>;
