// Typed errors with thiserror. Every fault resolves to a degraded-but-working page;
// nothing here is fatal and nothing crosses the event boundary.

use thiserror::Error;

/// Scroll engine error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrollError {
    #[error("Scroll engine unavailable: {0}")]
    InitializationUnavailable(String),

    #[error("Deep link to '{panel_id}' not resolved after {waited_ms}ms")]
    DeepLinkTimeout { panel_id: String, waited_ms: u32 },

    #[error("Card feed unavailable: {0}")]
    TransientFetchFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown panel: {0}")]
    UnknownPanel(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ScrollError {
    fn from(err: serde_json::Error) -> Self {
        ScrollError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ScrollError::InvalidConfig("duplicate panel id".to_string());
        assert!(err.to_string().contains("duplicate panel id"));

        let err = ScrollError::DeepLinkTimeout {
            panel_id: "blog".to_string(),
            waited_ms: 2000,
        };
        assert_eq!(err.to_string(), "Deep link to 'blog' not resolved after 2000ms");
    }

    #[test]
    fn serde_errors_convert() {
        let err: ScrollError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ScrollError::Serialization(_)));
    }
}
