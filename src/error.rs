use thiserror::Error;

/// Everything that can go wrong while driving a lab session. None of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabError {
    /// The open addressing probe loop used up its `2 * size` attempts.
    #[error("no free slot for id {id} after {attempts} attempts")]
    InsertionExhausted { id: u64, attempts: usize },

    #[error("nothing to undo")]
    UndoEmpty,

    /// Insertion was requested before a probe mode was selected.
    #[error("no probe mode selected")]
    InvalidMode,

    #[error("the table is empty, nothing to collide with")]
    EmptyTable,

    #[error("invalid configuration: {message}")]
    Configuration { message: String },
}

impl LabError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for the conditions a caller is expected to shrug off and keep going.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::InsertionExhausted { .. } | Self::UndoEmpty)
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
