#[derive(Debug, thiserror::Error)]
pub enum ViewPortError {
    /// Malformed graph: bad primitive data, missing child uid, or a cycle
    /// in child references. The offending operation is rejected whole.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Element id, graph id, or scene unknown to the coordinator.
    #[error("not found")]
    NotFound,

    /// Semantic query against a viewport started with semantics off.
    #[error("semantic index is disabled")]
    SemanticDisabled,

    /// Synthetic click with no driver attached to carry the input.
    #[error("no driver attached")]
    NoDriver,

    /// Operation out of order, e.g. releasing a capture the caller does
    /// not hold.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The coordinator is gone.
    #[error("viewport channel closed")]
    ChannelClosed,
}
