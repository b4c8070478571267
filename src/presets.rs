// ==============================================================================
// presets.rs - READY-MADE VEHICLES
// ------------------------------------------------------------------------------
// Settings + chassis + attachment layout for the two stock vehicles. Units are
// centimetres and km/h like the rest of the core.
//
//   sport_car : GT86-ish, front steering, rear drive
//   tank      : heavy tracked hull, every wheel drives and steers
// ==============================================================================

use crate::curve::ResponseCurve;
use crate::math::Vec3;
use crate::settings::{SuspensionSpring, VehicleSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    #[default]
    SportCar,
    Tank,
}

impl PresetKind {
    pub fn build(self) -> VehiclePreset {
        match self {
            PresetKind::SportCar => sport_car_preset(),
            PresetKind::Tank => tank_preset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePreset {
    pub settings: VehicleSettings,
    pub mass: f32,                  // kg
    pub chassis_half_extents: Vec3, // cm
    pub chassis_com_offset: Vec3,   // cm, from collider centre
    /// Body-space spring attachments, one per spring, same order.
    pub attachments: Vec<(String, Vec3)>,
}

pub fn sport_car() -> VehicleSettings {
    sport_car_preset().settings
}

pub fn tank() -> VehicleSettings {
    tank_preset().settings
}

// --------------------------------------------------
// Sport car
// --------------------------------------------------

const SPORT_CAR_WHEELS: [(&str, [f32; 3], bool, bool); 4] = [
    // name, location, steering, drive
    ("wheel_fl", [125.0, 75.0, -15.0], true, false),
    ("wheel_fr", [125.0, -75.0, -15.0], true, false),
    ("wheel_rl", [-125.0, 75.0, -15.0], false, true),
    ("wheel_rr", [-125.0, -75.0, -15.0], false, true),
];

pub fn sport_car_preset() -> VehiclePreset {
    let mut settings = VehicleSettings::default();

    settings.engine.max_speed = 180.0;
    settings.engine.max_reverse_speed = 50.0;
    settings.engine.acceleration_curve = Some(ResponseCurve::from_points(&[
        (0.0, 700.0),
        (100.0, 450.0),
        (180.0, 150.0),
        (200.0, 0.0),
    ]));
    settings.engine.reversing_curve = Some(ResponseCurve::from_points(&[(0.0, 500.0), (50.0, 0.0)]));
    settings.engine.engine_braking_curve =
        Some(ResponseCurve::from_points(&[(0.0, 0.6), (180.0, 0.3)]));
    settings.engine.braking_curve = Some(ResponseCurve::from_points(&[(0.0, 1500.0), (180.0, 1200.0)]));

    settings.steering.steering_curve = Some(ResponseCurve::from_points(&[
        (0.0, 150.0),
        (20.0, 600.0),
        (100.0, 420.0),
        (180.0, 260.0),
    ]));
    settings.steering.linear_damping = 3.0;
    settings.steering.angular_damping = 8.0;

    settings.suspension.trace_length = 80.0;
    settings.suspension.springs = SPORT_CAR_WHEELS
        .iter()
        .map(|&(name, _, steering, drive)| {
            let mut spring = SuspensionSpring::new(name);
            spring.spring_force = 40.0;
            spring.target_height = 55.0;
            spring.damping = 5000.0;
            spring.wheel_radius = 35.0;
            spring.steering = steering;
            spring.drive = drive;
            spring.offset_min_max = (-30.0, 10.0);
            spring.swing_min_max = (-3.0, 3.0);
            spring
        })
        .collect();

    VehiclePreset {
        settings,
        mass: 1350.0,
        chassis_half_extents: Vec3::new(210.0, 100.0, 35.0),
        chassis_com_offset: Vec3::new(0.0, 0.0, -15.0),
        attachments: attachments(&SPORT_CAR_WHEELS),
    }
}

// --------------------------------------------------
// Tank
// --------------------------------------------------

const TANK_WHEELS: [(&str, [f32; 3], bool, bool); 8] = [
    ("track_l0", [200.0, 150.0, -40.0], true, true),
    ("track_l1", [70.0, 150.0, -40.0], true, true),
    ("track_l2", [-70.0, 150.0, -40.0], true, true),
    ("track_l3", [-200.0, 150.0, -40.0], true, true),
    ("track_r0", [200.0, -150.0, -40.0], true, true),
    ("track_r1", [70.0, -150.0, -40.0], true, true),
    ("track_r2", [-70.0, -150.0, -40.0], true, true),
    ("track_r3", [-200.0, -150.0, -40.0], true, true),
];

pub fn tank_preset() -> VehiclePreset {
    let mut settings = VehicleSettings::default();

    settings.engine.max_speed = 60.0;
    settings.engine.max_reverse_speed = 25.0;
    settings.engine.acceleration_curve =
        Some(ResponseCurve::from_points(&[(0.0, 300.0), (40.0, 200.0), (60.0, 0.0)]));
    settings.engine.reversing_curve = Some(ResponseCurve::from_points(&[(0.0, 200.0), (25.0, 0.0)]));
    settings.engine.engine_braking_curve = Some(ResponseCurve::constant(2.0));
    settings.engine.braking_curve = Some(ResponseCurve::constant(2000.0));

    settings.steering.steering_curve =
        Some(ResponseCurve::from_points(&[(0.0, 300.0), (30.0, 200.0), (60.0, 120.0)]));
    settings.steering.allow_steering_while_braking = true;
    settings.steering.linear_damping = 5.0;
    settings.steering.angular_damping = 10.0;
    settings.steering.drift_min_speed = f32::MAX;

    settings.suspension.trace_length = 120.0;
    settings.suspension.springs = TANK_WHEELS
        .iter()
        .map(|&(name, _, steering, drive)| {
            let mut spring = SuspensionSpring::new(name);
            spring.spring_force = 400.0;
            spring.target_height = 80.0;
            spring.damping = 50_000.0;
            spring.wheel_radius = 40.0;
            spring.steering = steering;
            spring.drive = drive;
            spring.offset_min_max = (-20.0, 15.0);
            spring
        })
        .collect();

    VehiclePreset {
        settings,
        mass: 32000.0,
        chassis_half_extents: Vec3::new(320.0, 170.0, 60.0),
        chassis_com_offset: Vec3::new(0.0, 0.0, -20.0),
        attachments: attachments(&TANK_WHEELS),
    }
}

fn attachments(wheels: &[(&str, [f32; 3], bool, bool)]) -> Vec<(String, Vec3)> {
    wheels
        .iter()
        .map(|&(name, [x, y, z], _, _)| (name.to_string(), Vec3::new(x, y, z)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveKind, CurveProvider};

    #[test]
    fn presets_define_every_curve() {
        for kind in [PresetKind::SportCar, PresetKind::Tank] {
            let preset = kind.build();
            for curve in CurveKind::ALL {
                assert!(preset.settings.has_curve(curve), "{kind:?} lacks {curve}");
            }
            assert_eq!(preset.attachments.len(), preset.settings.suspension.springs.len());
        }
    }

    #[test]
    fn sport_car_is_rear_wheel_drive() {
        let s = sport_car();
        assert_eq!(s.drive_wheel_count(), 2);
        assert_eq!(s.steering_wheel_count(), 2);
    }

    #[test]
    fn preset_kind_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Doc {
            vehicle: PresetKind,
        }
        let doc: Doc = toml::from_str("vehicle = \"tank\"").unwrap();
        assert_eq!(doc.vehicle, PresetKind::Tank);
    }
}
