use thiserror::Error;

/// Failures of the hierarchical path. The adapter turns every one of them into a
/// fallback placement, so they never reach callers of the layout functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("hierarchical layout engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("hierarchical layout engine panicked: {0}")]
    EnginePanicked(String),
    #[error("layout engine returned no coordinates for node `{0}`")]
    MissingCoordinates(String),
    #[error("layout engine returned non-finite coordinates for node `{0}`")]
    NonFiniteCoordinates(String),
}

pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
