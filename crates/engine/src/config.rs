use frameline_assets::AssetManager;
use frameline_render::{GlobalRenderingRes, RenderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Engine startup settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory every asset url is resolved against.
    pub asset_root: PathBuf,
    pub global_rendering_res_url: String,
    /// `"forward"` or `"deferred"`.
    pub pipeline: String,
    /// Overrides the global bundle's FXAA toggle when set.
    pub enable_fxaa: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            global_rendering_res_url: "asset/global/rendering.global.json".into(),
            pipeline: "deferred".into(),
            enable_fxaa: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "engine config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn asset_manager(&self) -> AssetManager {
        AssetManager::new(&self.asset_root)
    }

    /// Load the global bundle and build the render configuration.
    pub fn render_config(&self, assets: &AssetManager) -> Result<RenderConfig, EngineError> {
        let config = RenderConfig::load(
            assets,
            &self.global_rendering_res_url,
            &self.pipeline,
            self.enable_fxaa,
        )?;
        Ok(config)
    }

    /// Render configuration over the built-in global bundle, for runs
    /// without an asset tree.
    pub fn builtin_render_config(&self) -> Result<RenderConfig, EngineError> {
        let config = RenderConfig::new(&self.pipeline, self.enable_fxaa, GlobalRenderingRes::default())?;
        Ok(config)
    }
}
