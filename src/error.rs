use thiserror::Error;

use crate::model::ParticipantId;

pub type SantaResult<T> = Result<T, SantaError>;

#[derive(Debug, Error)]
pub enum SantaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unknown participant id, or no event at all.
    #[error("Invalid link. Please check your Secret Santa link.")]
    NotFound,

    #[error("No available participants to assign")]
    NoAvailableRecipient,

    #[error("assignment points at {0}, which is not in the roster")]
    DanglingAssignment(ParticipantId),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ValidationError {
    #[error("At least 2 participants are required")]
    TooFewParticipants,

    #[error("An even number of participants is required")]
    OddParticipantCount,

    #[error("Budget message is required")]
    MissingBudget,

    #[error("Event details are required")]
    MissingDetails,
}
