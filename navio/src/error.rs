use thiserror::Error;

/// Errors that cross the public API boundary.
///
/// Configuration problems found while resolving a layout are not errors; they
/// are logged and the affected entry renders empty.
#[derive(Debug, Error)]
pub enum NavioError {
    #[cfg(feature = "toml")]
    #[error("failed to parse layout TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid root route `{0}`, expected `<stacks|tabs|drawers>.<name>`")]
    InvalidRoot(String),
    #[error("no component provided for screen `{0}`")]
    MissingComponent(String),
}
