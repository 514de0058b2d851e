//! Startup configuration of the render system.

use frameline_assets::AssetManager;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::desc::{ColorGradingResourceDesc, IblResourceDesc, LevelResourceDesc, SkyBoxMaps};
use crate::error::ConfigError;
use crate::pipeline::PipelineStrategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub pose: CameraPose,
    /// Aspect as width and height, e.g. `[16, 9]`.
    pub aspect: Vec2,
    pub z_near: f32,
    pub z_far: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLightDesc {
    pub direction: Vec3,
    pub color: Vec3,
}

/// The global rendering resource bundle, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRenderingRes {
    #[serde(default)]
    pub enable_fxaa: bool,
    pub skybox_irradiance_map: SkyBoxMaps,
    pub skybox_specular_map: SkyBoxMaps,
    pub brdf_map: String,
    pub color_grading_map: String,
    pub ambient_light: Vec3,
    pub camera_config: CameraConfig,
    pub directional_light: DirectionalLightDesc,
}

impl Default for GlobalRenderingRes {
    fn default() -> Self {
        let sky = |kind: &str| SkyBoxMaps {
            negative_x: format!("asset/texture/sky/{kind}/nx.hdr"),
            positive_x: format!("asset/texture/sky/{kind}/px.hdr"),
            negative_y: format!("asset/texture/sky/{kind}/ny.hdr"),
            positive_y: format!("asset/texture/sky/{kind}/py.hdr"),
            negative_z: format!("asset/texture/sky/{kind}/nz.hdr"),
            positive_z: format!("asset/texture/sky/{kind}/pz.hdr"),
        };
        Self {
            enable_fxaa: false,
            skybox_irradiance_map: sky("irradiance"),
            skybox_specular_map: sky("specular"),
            brdf_map: "asset/texture/global/brdf_schilk.hdr".into(),
            color_grading_map: "asset/texture/lut/color_grading_lut.png".into(),
            ambient_light: Vec3::splat(0.03),
            camera_config: CameraConfig {
                pose: CameraPose {
                    position: Vec3::new(0.0, 10.0, 15.0),
                    target: Vec3::ZERO,
                    up: Vec3::Y,
                },
                aspect: Vec2::new(16.0, 9.0),
                z_near: 0.1,
                z_far: 1000.0,
            },
            directional_light: DirectionalLightDesc {
                direction: Vec3::new(-1.0, -1.0, -1.0),
                color: Vec3::ONE,
            },
        }
    }
}

fn malformed(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        field,
        reason: reason.into(),
    }
}

impl GlobalRenderingRes {
    /// Reject bundles the render system cannot start from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, maps) in [
            ("skybox_irradiance_map", &self.skybox_irradiance_map),
            ("skybox_specular_map", &self.skybox_specular_map),
        ] {
            if maps.faces().iter().any(|face| face.is_empty()) {
                return Err(malformed(field, "every cube face needs a texture"));
            }
        }
        if self.brdf_map.is_empty() {
            return Err(malformed("brdf_map", "path is empty"));
        }
        if self.color_grading_map.is_empty() {
            return Err(malformed("color_grading_map", "path is empty"));
        }
        let dir = self.directional_light.direction;
        if !dir.is_finite() || dir.length_squared() == 0.0 {
            return Err(malformed("directional_light.direction", "must be a non-zero vector"));
        }
        let camera = &self.camera_config;
        if !(camera.aspect.x > 0.0 && camera.aspect.y > 0.0) {
            return Err(malformed("camera_config.aspect", "both components must be positive"));
        }
        if !(camera.z_near > 0.0 && camera.z_far > camera.z_near) {
            return Err(malformed(
                "camera_config",
                format!("need 0 < z_near < z_far, got {} / {}", camera.z_near, camera.z_far),
            ));
        }
        Ok(())
    }

    /// Level resource descriptor with every texture resolved to a full path.
    pub fn level_resource_desc(&self, assets: &AssetManager) -> LevelResourceDesc {
        let resolve = |url: &str| assets.full_path_string(url);
        LevelResourceDesc {
            ibl: IblResourceDesc {
                skybox_irradiance_map: self.skybox_irradiance_map.map_faces(resolve),
                skybox_specular_map: self.skybox_specular_map.map_faces(resolve),
                brdf_map: resolve(&self.brdf_map),
            },
            color_grading: ColorGradingResourceDesc {
                color_grading_map: resolve(&self.color_grading_map),
            },
        }
    }
}

/// Everything [`RenderSystem::new`](crate::RenderSystem::new) needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub strategy: PipelineStrategy,
    pub enable_fxaa: bool,
    pub global: GlobalRenderingRes,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strategy: PipelineStrategy::default(),
            enable_fxaa: false,
            global: GlobalRenderingRes::default(),
        }
    }
}

impl RenderConfig {
    /// Build a config from an already-loaded bundle. `enable_fxaa` overrides
    /// the bundle's own toggle when set.
    pub fn new(
        strategy: &str,
        enable_fxaa: Option<bool>,
        global: GlobalRenderingRes,
    ) -> Result<Self, ConfigError> {
        let strategy: PipelineStrategy = strategy.parse()?;
        global.validate()?;
        Ok(Self {
            strategy,
            enable_fxaa: enable_fxaa.unwrap_or(global.enable_fxaa),
            global,
        })
    }

    /// Load the global bundle through the asset manager and build a config.
    pub fn load(
        assets: &AssetManager,
        global_rendering_res_url: &str,
        strategy: &str,
        enable_fxaa: Option<bool>,
    ) -> Result<Self, ConfigError> {
        let global: GlobalRenderingRes = assets.load_asset(global_rendering_res_url)?;
        Self::new(strategy, enable_fxaa, global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bundle_is_valid() {
        assert!(GlobalRenderingRes::default().validate().is_ok());
    }

    #[test]
    fn zero_light_direction_is_malformed() {
        let mut res = GlobalRenderingRes::default();
        res.directional_light.direction = Vec3::ZERO;
        let err = res.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Malformed {
                field: "directional_light.direction",
                ..
            }
        ));
    }

    #[test]
    fn empty_skybox_face_is_malformed() {
        let mut res = GlobalRenderingRes::default();
        res.skybox_specular_map.positive_y.clear();
        assert!(matches!(
            res.validate(),
            Err(ConfigError::Malformed {
                field: "skybox_specular_map",
                ..
            })
        ));
    }

    #[test]
    fn inverted_depth_range_is_malformed() {
        let mut res = GlobalRenderingRes::default();
        res.camera_config.z_near = 10.0;
        res.camera_config.z_far = 1.0;
        assert!(res.validate().is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = RenderConfig::new("raytraced", None, GlobalRenderingRes::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPipeline(ref s) if s == "raytraced"));
    }

    #[test]
    fn fxaa_override_wins() {
        let mut res = GlobalRenderingRes::default();
        res.enable_fxaa = true;
        let config = RenderConfig::new("forward", Some(false), res.clone()).unwrap();
        assert!(!config.enable_fxaa);
        let config = RenderConfig::new("forward", None, res).unwrap();
        assert!(config.enable_fxaa);
        assert_eq!(config.strategy, PipelineStrategy::Forward);
    }

    #[test]
    fn level_resource_paths_are_resolved() {
        let assets = AssetManager::new("/game");
        let desc = GlobalRenderingRes::default().level_resource_desc(&assets);
        assert_eq!(desc.ibl.brdf_map, "/game/asset/texture/global/brdf_schilk.hdr");
        assert!(desc.ibl.skybox_irradiance_map.negative_x.starts_with("/game/"));
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(dir.path());
        let json = serde_json::to_string(&GlobalRenderingRes::default()).unwrap();
        std::fs::write(dir.path().join("global.json"), json).unwrap();

        let config = RenderConfig::load(&assets, "global.json", "deferred", Some(true)).unwrap();
        assert_eq!(config.strategy, PipelineStrategy::Deferred);
        assert!(config.enable_fxaa);
    }

    #[test]
    fn load_missing_bundle_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetManager::new(dir.path());
        let err = RenderConfig::load(&assets, "missing.json", "deferred", None).unwrap_err();
        assert!(matches!(err, ConfigError::Asset(_)));
    }
}
