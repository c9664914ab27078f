use serde::{Deserialize, Serialize};

use crate::error::StageResult;
use crate::interaction::InteractionSettings;
use crate::log;


pub const DEFAULT_MODEL_URL: &str = "public/DamagedHelmet.gltf";
pub const DEFAULT_ENVIRONMENT_URL: &str =
    "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/pond_bridge_night_1k.hdr";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +z.
    pub distance: f32,
}
impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 40.0,
            near: 0.1,
            far: 100.0,
            distance: 3.5,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    /// RGB split distance in UV units.
    pub rgb_shift_amount: f32,
    /// Split direction in radians.
    pub rgb_shift_angle: f32,
    pub exposure: f32,
}
impl Default for PostSettings {
    fn default() -> Self {
        Self {
            rgb_shift_amount: 0.0015,
            rgb_shift_angle: 0.0,
            exposure: 1.0,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub canvas_selector: String,
    pub model_url: String,
    pub environment_url: String,
    pub max_pixel_ratio: f64,
    pub camera: CameraSettings,
    pub post: PostSettings,
    pub interaction: InteractionSettings,
}
impl Default for StageConfig {
    fn default() -> Self {
        Self {
            canvas_selector: "#canvas".to_string(),
            model_url: DEFAULT_MODEL_URL.to_string(),
            environment_url: DEFAULT_ENVIRONMENT_URL.to_string(),
            max_pixel_ratio: 2.0,
            camera: CameraSettings::default(),
            post: PostSettings::default(),
            interaction: InteractionSettings::default(),
        }
    }
}
impl StageConfig {
    /// Missing fields keep their defaults.
    pub fn from_json(json: &str) -> StageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }


    /// Applies `?model=`, `?environment=`, `?rgb_shift=` and `?exposure=`.
    /// Unknown keys are skipped; unparsable numbers are logged and skipped.
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                "model" if !value.is_empty() => self.model_url = value.to_string(),
                "environment" if !value.is_empty() => self.environment_url = value.to_string(),
                "rgb_shift" => match value.parse::<f32>() {
                    Ok(v) if v.is_finite() => self.post.rgb_shift_amount = v,
                    _ => log!("StageConfig::with_query(): WARNING: bad rgb_shift={}", value),
                },
                "exposure" => match value.parse::<f32>() {
                    Ok(v) if v.is_finite() && v > 0.0 => self.post.exposure = v,
                    _ => log!("StageConfig::with_query(): WARNING: bad exposure={}", value),
                },
                _ => {},
            }
        }
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::{Ease, Overwrite};

    #[test]
    fn defaults_match_the_page() {
        let config = StageConfig::default();
        assert_eq!(config.model_url, "public/DamagedHelmet.gltf");
        assert!(config.environment_url.ends_with("pond_bridge_night_1k.hdr"));
        assert_eq!(config.camera.fov_degrees, 40.0);
        assert_eq!(config.camera.distance, 3.5);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.post.rgb_shift_amount, 0.0015);
        assert_eq!(config.interaction.duration, 0.9);
        assert_eq!(config.interaction.ease, Ease::POWER2_OUT);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StageConfig::from_json(
            r#"{ "model_url": "models/Fox.glb", "interaction": { "ease": "power1.inOut", "overwrite": "none" } }"#,
        )
        .unwrap();
        assert_eq!(config.model_url, "models/Fox.glb");
        assert_eq!(config.interaction.overwrite, Overwrite::None);
        assert_eq!(config.interaction.duration, 0.9);
        assert_eq!(config.canvas_selector, "#canvas");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(StageConfig::from_json("{ model_url: 3").is_err());
        assert!(StageConfig::from_json(r#"{ "interaction": { "ease": "wobble" } }"#).is_err());
    }

    #[test]
    fn query_overrides() {
        let config = StageConfig::default().with_query([
            ("model", "other.glb"),
            ("rgb_shift", "0.01"),
            ("exposure", "-1"),
            ("environment", ""),
            ("unrelated", "x"),
        ]);
        assert_eq!(config.model_url, "other.glb");
        assert_eq!(config.post.rgb_shift_amount, 0.01);
        assert_eq!(config.post.exposure, 1.0);
        assert_eq!(config.environment_url, DEFAULT_ENVIRONMENT_URL);
    }
}
