//! `ViewerConfig` – layered configuration (defaults → TOML file → env).
//!
//! | Key                     | Default   | Description                                   |
//! |-------------------------|-----------|-----------------------------------------------|
//! | `tile_size`             | `64.0`    | World units per tile side                     |
//! | `smoothing_rate`        | `0.2`     | Fraction of remaining distance per reference frame |
//! | `reference_frame_secs`  | `1/60`    | Frame length `smoothing_rate` is expressed in |
//! | `entity_radius`         | `0.45`    | Pick radius around an entity, in tiles        |
//! | `toggle_key`            | `84` (T)  | Key code cycling the view mode                |
//! | `cancel_key`            | `27` (Esc)| Reserved key code                             |
//! | `mode`                  | `admin`   | `admin` / `spectator` / `player`              |
//! | `initial_view`          | `client`  | `client` / `counts` / `values`                |
//! | `fps`                   | `60.0`    | Frame loop rate of the binary                 |
//! | `orbit_rate`            | `0.0`     | Camera orbit speed (rad/s), 0 disables         |
//! | `camera_height`         | `4000.0`  | Initial camera height in world units          |
//! | `width` / `height`      | `1280`/`720` | Initial viewport size in pixels            |
//!
//! Every key can be overridden with a `TILEVIEW_<KEY>` environment variable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{ClientMode, ViewMode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub tile_size: f32,
    pub smoothing_rate: f32,
    pub reference_frame_secs: f32,
    pub entity_radius: f32,
    pub toggle_key: u32,
    pub cancel_key: u32,
    pub mode: ClientMode,
    pub initial_view: ViewMode,
    pub fps: f32,
    pub orbit_rate: f32,
    pub camera_height: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tile_size: 64.0,
            smoothing_rate: 0.2,
            reference_frame_secs: 1.0 / 60.0,
            entity_radius: 0.45,
            toggle_key: 84,
            cancel_key: 27,
            mode: ClientMode::Admin,
            initial_view: ViewMode::Client,
            fps: 60.0,
            orbit_rate: 0.0,
            camera_height: 4000.0,
            width: 1280,
            height: 720,
        }
    }
}

impl ViewerConfig {
    /// Build the configuration from defaults, an optional TOML file and
    /// `TILEVIEW_*` environment variables, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(config::Environment::with_prefix("TILEVIEW").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Smoothing rate clamped into `[0, 1)` so interpolation can never overshoot.
    pub fn clamped_smoothing_rate(&self) -> f32 {
        if self.smoothing_rate.is_finite() {
            self.smoothing_rate.clamp(0.0, 0.999)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_bind_t_and_escape() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.toggle_key, 84);
        assert_eq!(cfg.cancel_key, 27);
        assert_eq!(cfg.initial_view, ViewMode::Client);
        assert_eq!(cfg.mode, ClientMode::Admin);
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let cfg = ViewerConfig::load(None).unwrap();
        assert_eq!(cfg.width, ViewerConfig::default().width);
        assert_eq!(cfg.toggle_key, ViewerConfig::default().toggle_key);
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "tileview-config-test-{}.toml",
            std::process::id()
        ));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "smoothing_rate = 0.5").unwrap();
            writeln!(f, "mode = \"spectator\"").unwrap();
            writeln!(f, "initial_view = \"values\"").unwrap();
        }

        let cfg = ViewerConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert!((cfg.smoothing_rate - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.mode, ClientMode::Spectator);
        assert_eq!(cfg.initial_view, ViewMode::Values);
        assert_eq!(cfg.toggle_key, 84);
    }

    #[test]
    fn smoothing_rate_is_clamped_below_one() {
        let mut cfg = ViewerConfig::default();
        cfg.smoothing_rate = 3.0;
        assert!(cfg.clamped_smoothing_rate() < 1.0);
        cfg.smoothing_rate = -1.0;
        assert_eq!(cfg.clamped_smoothing_rate(), 0.0);
        cfg.smoothing_rate = f32::NAN;
        assert_eq!(cfg.clamped_smoothing_rate(), 0.0);
    }
}
