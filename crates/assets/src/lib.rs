//! Asset manager: resolves asset urls against an asset root and loads typed
//! JSON assets.
//!
//! Asset urls are relative paths such as `asset/texture/default/albedo.jpg`.
//! The renderer keys resources by the resolved full path so two urls naming
//! the same file dedupe to one resource.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolves and loads assets below a root directory.
#[derive(Debug, Clone)]
pub struct AssetManager {
    root: PathBuf,
}

impl AssetManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an asset url to a full path. Absolute urls pass through.
    pub fn full_path(&self, url: impl AsRef<Path>) -> PathBuf {
        let url = url.as_ref();
        if url.is_absolute() {
            url.to_path_buf()
        } else {
            self.root.join(url)
        }
    }

    /// Full path rendered with forward slashes, for use as a resource key.
    pub fn full_path_string(&self, url: impl AsRef<Path>) -> String {
        self.full_path(url).to_string_lossy().replace('\\', "/")
    }

    pub fn exists(&self, url: impl AsRef<Path>) -> bool {
        self.full_path(url).is_file()
    }

    /// Load and deserialize a JSON asset.
    pub fn load_asset<T: DeserializeOwned>(&self, url: impl AsRef<Path>) -> Result<T, AssetError> {
        let path = self.full_path(url);
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }
        let data = std::fs::read_to_string(&path)?;
        let asset = serde_json::from_str(&data).map_err(|source| AssetError::Json {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "asset loaded");
        Ok(asset)
    }

    /// Serialize an asset to JSON, creating parent directories as needed.
    pub fn save_asset<T: Serialize>(&self, url: impl AsRef<Path>, asset: &T) -> Result<(), AssetError> {
        let path = self.full_path(url);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, asset).map_err(|source| AssetError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: u32,
    }

    #[test]
    fn relative_urls_resolve_under_root() {
        let assets = AssetManager::new("/game");
        assert_eq!(
            assets.full_path("asset/mesh/cube.obj"),
            PathBuf::from("/game/asset/mesh/cube.obj")
        );
        assert_eq!(
            assets.full_path_string("asset/mesh/cube.obj"),
            "/game/asset/mesh/cube.obj"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let assets = AssetManager::new("/game");
        assert_eq!(assets.full_path("/tmp/x.json"), PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(dir.path());
        let sample = Sample {
            name: "sample".into(),
            value: 3,
        };
        assets.save_asset("global/sample.json", &sample).unwrap();
        assert!(assets.exists("global/sample.json"));

        let loaded: Sample = assets.load_asset("global/sample.json").unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn missing_asset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(dir.path());
        let err = assets.load_asset::<Sample>("nope.json").unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let assets = AssetManager::new(dir.path());
        let err = assets.load_asset::<Sample>("bad.json").unwrap_err();
        assert!(matches!(err, AssetError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
