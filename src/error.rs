use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The iteration cap must allow at least one propagation step.
    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    /// The cancellation flag was raised at a generation boundary.
    #[error("label propagation cancelled at generation {generation}")]
    Cancelled { generation: usize },

    /// Malformed edge list or GFA input, `line` is 1-based.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
