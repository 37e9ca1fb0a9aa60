use thiserror::Error;

/// Failure taxonomy for the harness. Every variant surfaces synchronously to
/// the test author; nothing is swallowed, since the whole point of the
/// harness is to make skill defects visible.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed interaction model, or a sample phrase referencing a slot its
    /// intent does not declare. Raised at model-build time.
    #[error("interaction model error: {0}")]
    Model(String),

    /// Bad call from the test author: unknown intent, slot not declared on
    /// the target intent. Raised before any dispatch happens.
    #[error("invocation error: {0}")]
    Invocation(String),

    /// No sample phrase matched a free-text utterance.
    #[error("no intent matches utterance: {utterance}")]
    NoMatch { utterance: String },

    /// A dialog directive referenced an intent the model does not declare as
    /// dialog-capable. Indicates a model/handler mismatch.
    #[error("dialog error: {0}")]
    Dialog(String),

    /// Transport or JSON failure while invoking the skill handler.
    #[error("handler invocation failed: {0}")]
    Handler(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
