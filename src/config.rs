//! Server configuration, loaded from TOML. Every field has a default so an
//! empty file (or no file) gives a runnable server.

use crate::animation::AnimationSettings;
use crate::error::ConfigError;
use crate::math::Vec3;
use crate::presets::PresetKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Preset given to connecting players.
    #[serde(default)]
    pub vehicle: PresetKind,
    /// Player spawn point, cm. Players are spread along +Y from here.
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
    #[serde(default = "default_spawn_spacing")]
    pub spawn_spacing: f32,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub sanity: SanityBox,
    /// Forward top speed scale given to player vehicles.
    #[serde(default = "default_max_speed_multiplier")]
    pub max_speed_multiplier: f32,
    #[serde(default)]
    pub ai_vehicles: Vec<AiVehicleConfig>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:9001".to_string()
}
fn default_tick_hz() -> u32 {
    60
}
fn default_spawn() -> [f32; 3] {
    [0.0, 0.0, 150.0]
}
fn default_spawn_spacing() -> f32 {
    600.0
}
fn default_max_speed_multiplier() -> f32 {
    1.0
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tick_hz: default_tick_hz(),
            vehicle: PresetKind::SportCar,
            spawn: default_spawn(),
            spawn_spacing: default_spawn_spacing(),
            animation: AnimationSettings::default(),
            sanity: SanityBox::default(),
            max_speed_multiplier: default_max_speed_multiplier(),
            ai_vehicles: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Seconds per tick; a zero rate falls back to 60 Hz.
    pub fn tick_dt(&self) -> f32 {
        let hz = if self.tick_hz == 0 { default_tick_hz() } else { self.tick_hz };
        1.0 / hz as f32
    }

    pub fn player_spawn(&self, index: usize) -> Vec3 {
        let [x, y, z] = self.spawn;
        Vec3::new(x, y + index as f32 * self.spawn_spacing, z)
    }
}

/// Bodies outside this box (or with non-finite positions) are teleported
/// back to their spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityBox {
    /// cm, applied to X and Y.
    #[serde(default = "default_half_extent")]
    pub half_extent: f32,
    #[serde(default = "default_min_z")]
    pub min_z: f32,
    #[serde(default = "default_max_z")]
    pub max_z: f32,
}

fn default_half_extent() -> f32 {
    50_000.0
}
fn default_min_z() -> f32 {
    -1_000.0
}
fn default_max_z() -> f32 {
    50_000.0
}

impl Default for SanityBox {
    fn default() -> Self {
        Self {
            half_extent: default_half_extent(),
            min_z: default_min_z(),
            max_z: default_max_z(),
        }
    }
}

impl SanityBox {
    pub fn contains(&self, location: &Vec3) -> bool {
        location.iter().all(|c| c.is_finite())
            && location.x.abs() <= self.half_extent
            && location.y.abs() <= self.half_extent
            && (self.min_z..=self.max_z).contains(&location.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiVehicleConfig {
    #[serde(default)]
    pub preset: PresetKind,
    pub spawn: [f32; 3],
    /// Degrees about +Z.
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub waypoints: Vec<[f32; 3]>,
    #[serde(default)]
    pub looped: bool,
    #[serde(default = "default_acceptance_radius")]
    pub acceptance_radius: f32,
}

fn default_acceptance_radius() -> f32 {
    300.0
}

impl AiVehicleConfig {
    pub fn spawn_location(&self) -> Vec3 {
        Vec3::from(self.spawn)
    }

    pub fn waypoints(&self) -> Vec<Vec3> {
        self.waypoints.iter().copied().map(Vec3::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_default_server() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr, "0.0.0.0:9001");
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn ai_routes_parse() {
        let config = ServerConfig::from_toml(
            r#"
            vehicle = "tank"
            tick_hz = 30

            [animation.wheels]
            max_direction = 35.0

            [[ai_vehicles]]
            spawn = [0.0, 2000.0, 150.0]
            waypoints = [[3000.0, 2000.0, 0.0], [3000.0, -2000.0, 0.0]]
            looped = true
            "#,
        )
        .unwrap();

        assert_eq!(config.vehicle, PresetKind::Tank);
        assert_eq!(config.tick_hz, 30);
        assert_eq!(config.animation.wheels.max_direction, 35.0);
        let ai = &config.ai_vehicles[0];
        assert_eq!(ai.preset, PresetKind::SportCar);
        assert!(ai.looped);
        assert_eq!(ai.acceptance_radius, 300.0);
        assert_eq!(ai.waypoints()[1], Vec3::new(3000.0, -2000.0, 0.0));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ServerConfig::from_toml("tick_hz = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ServerConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn sanity_box_rejects_nan_and_falls() {
        let sanity = SanityBox::default();
        assert!(sanity.contains(&Vec3::new(100.0, -100.0, 50.0)));
        assert!(!sanity.contains(&Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!sanity.contains(&Vec3::new(0.0, 0.0, -5_000.0)));
        assert!(!sanity.contains(&Vec3::new(60_000.0, 0.0, 0.0)));
    }

    #[test]
    fn players_spread_along_y() {
        let config = ServerConfig::default();
        assert_eq!(config.player_spawn(2), Vec3::new(0.0, 1200.0, 150.0));
    }
}
