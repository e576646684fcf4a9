pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("invalid JSON pointer: {path:?}")]
    InvalidPointer { path: String },

    #[error("{op} failed: nothing at {path:?}")]
    PathNotFound { op: &'static str, path: String },

    #[error("index {index} out of bounds at {path:?} (len {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("cannot descend into scalar at {path:?}")]
    NotAContainer { path: String },

    #[error("patch has {ops} operations (max {max})")]
    PatchTooLarge { ops: usize, max: usize },

    #[error("pointer depth {depth} exceeds {max}")]
    PointerTooDeep { depth: usize, max: usize },

    #[error("malformed event: {message}")]
    MalformedEvent { message: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String, data: Option<serde_json::Value> },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("wait for snapshot {snapshot_id} abandoned at teardown")]
    WaitAbandoned { snapshot_id: u64 },

    #[error("request {id} abandoned at teardown")]
    RequestAbandoned { id: u64 },

    #[error("local state diverged from the remote; reload the workflow")]
    SessionDiverged,

    #[error("unknown object {id:?}")]
    UnknownObject { id: String },

    #[error("json error: {message}")]
    Json { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json { message: e.to_string() }
    }
}

impl Error {
    /// Stable snake_case code for hosts that surface errors as data.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidPointer { .. } => "invalid_pointer",
            Error::PathNotFound { .. } => "path_not_found",
            Error::IndexOutOfBounds { .. } => "index_out_of_bounds",
            Error::NotAContainer { .. } => "not_a_container",
            Error::PatchTooLarge { .. } => "patch_too_large",
            Error::PointerTooDeep { .. } => "pointer_too_deep",
            Error::MalformedEvent { .. } => "malformed_event",
            Error::MalformedResponse { .. } => "malformed_response",
            Error::Remote { .. } => "remote_error",
            Error::Transport { .. } => "transport_error",
            Error::WaitAbandoned { .. } => "wait_abandoned",
            Error::RequestAbandoned { .. } => "request_abandoned",
            Error::SessionDiverged => "session_diverged",
            Error::UnknownObject { .. } => "unknown_object",
            Error::Json { .. } => "json_error",
        }
    }

    /// Protocol violations leave local state untrustworthy.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPointer { .. }
                | Error::PathNotFound { .. }
                | Error::IndexOutOfBounds { .. }
                | Error::NotAContainer { .. }
                | Error::MalformedEvent { .. }
                | Error::MalformedResponse { .. }
        )
    }
}
