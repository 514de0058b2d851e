use frameline_assets::AssetError;

/// Errors that halt startup. Never raised from inside a frame.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported render pipeline type: {0:?}")]
    UnknownPipeline(String),
    #[error("malformed global rendering resource: {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
    #[error("failed to load global rendering resource: {0}")]
    Asset(#[from] AssetError),
}

/// Errors reported by a render device.
///
/// Inside a frame these are absorbed per object: the uploader substitutes a
/// placeholder or skips the part and keeps going.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    #[error("asset missing: {0}")]
    AssetMissing(String),
    #[error("upload of {resource} failed: {reason}")]
    Upload { resource: String, reason: String },
}

/// Errors from render system construction.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("device initialization failed: {0}")]
    Device(#[from] DeviceError),
}
