use crate::state::{ReportStatus, UserRole};

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("no legal transition from {from} to {to}")]
    InvalidTransition {
        from: ReportStatus,
        to: ReportStatus,
    },
    #[error("{role} is not authorized to {action}")]
    Unauthorized { role: UserRole, action: String },
    #[error("reply nesting would exceed the maximum depth of {max}")]
    DepthExceeded { max: u32 },
    #[error("no record found for {0}")]
    NotFound(String),
    #[error("report was changed by another actor, reload and retry")]
    ConcurrentModification,
    #[error("report content cannot be edited while in status {0}")]
    NotEditable(ReportStatus),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Storage(#[from] sled::Error),
    #[error("failed to decode a stored record: {0}")]
    Codec(String),
    #[error("failed to mint an identifier: {0}")]
    Identifier(String),
}

#[derive(thiserror::Error, Debug)]
pub enum DraftError {
    #[error("report title is missing or empty")]
    MissingTitle,
    #[error("report summary is missing or empty")]
    MissingSummary,
    #[error("report priority is not set")]
    MissingPriority,
}
