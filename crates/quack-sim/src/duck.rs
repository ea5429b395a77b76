//! Per-duck rules: how input, size and food turn into motion and growth.

use glam::Vec2;
use quack_protocol::{DuckState, InputFlags};

use crate::{BodyHandle, SimConfig};

/// Server-side duck: the wire snapshot plus what only the server knows.
#[derive(Debug, Clone)]
pub(crate) struct Duck {
    pub(crate) state: DuckState,
    /// Latest input; replaced wholesale by each Input message.
    pub(crate) input: InputFlags,
    /// Banked food credit not yet converted into growth.
    pub(crate) food: f32,
    pub(crate) body: BodyHandle,
}

impl Duck {
    /// Force and torque this duck's input asks for at its current size.
    ///
    /// Up wins over down and left wins over right when both are held.
    pub(crate) fn control(&self, config: &SimConfig) -> (Vec2, f32) {
        let scale = self.state.scale;
        let forward = Vec2::from_angle(self.state.rotation);
        let push = move_force(scale, self.input.sprint, config);
        let force = if self.input.up {
            forward * push
        } else if self.input.down {
            -forward * push
        } else {
            Vec2::ZERO
        };

        let turn = turn_torque(scale, config);
        let torque = if self.input.left {
            turn
        } else if self.input.right {
            -turn
        } else {
            0.0
        };
        (force, torque)
    }
}

/// Forward force magnitude: `move_force * s * sqrt(s)`, times `sqrt(s + 1)`
/// while sprinting.
pub fn move_force(scale: f32, sprint: bool, config: &SimConfig) -> f32 {
    let base = config.move_force * scale * scale.sqrt();
    if sprint {
        base * (scale + 1.0).sqrt()
    } else {
        base
    }
}

/// Turning torque magnitude: `turn_torque * s³`.
pub fn turn_torque(scale: f32, config: &SimConfig) -> f32 {
    config.turn_torque * scale * scale * scale
}

/// Scale after sprinting for `dt` seconds, floored at `min_scale`.
pub fn sprint_shrink(scale: f32, dt: f32, config: &SimConfig) -> f32 {
    (scale - config.sprint_shrink_rate / scale * dt).max(config.min_scale)
}

/// Converts banked food into growth for one tick.
///
/// Returns `(food_used, new_scale)`. The amount used is
/// `min(food, max(rate * dt * food, rate * dt))`, so large banks drain
/// proportionally and small ones still drain at a minimum rate. Growth per
/// unit of food falls off with `1 / sqrt(scale)`.
pub fn growth_step(food: f32, scale: f32, dt: f32, config: &SimConfig) -> (f32, f32) {
    if food <= 0.0 {
        return (0.0, scale);
    }
    let floor = config.growth_rate * dt;
    let used = (floor * food).max(floor).min(food);
    let grown = scale + used * config.growth_factor / scale.sqrt();
    (used, grown)
}

/// Whether a duck of `predator` scale may eat one of `prey` scale.
///
/// Compares areas: `predator² > prey² * ratio`. Equality does not count.
pub fn can_eat(predator: f32, prey: f32, ratio: f32) -> bool {
    predator * predator > prey * prey * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use quack_protocol::PlayerId;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn duck_with(input: InputFlags, scale: f32, rotation: f32) -> Duck {
        Duck {
            state: DuckState {
                id: PlayerId(1),
                name: "d".into(),
                x: 0.0,
                y: 0.0,
                rotation,
                scale,
                timestamp: 0,
            },
            input,
            food: 0.0,
            body: BodyHandle(1),
        }
    }

    #[test]
    fn test_move_force_scales_with_size() {
        let cfg = SimConfig::default();
        assert!(approx(move_force(1.0, false, &cfg), 50.0));
        assert!(approx(move_force(4.0, false, &cfg), 400.0));
        assert!(approx(move_force(1.0, true, &cfg), 50.0 * 2f32.sqrt()));
        assert!(approx(move_force(3.0, true, &cfg), 50.0 * 3.0 * 3f32.sqrt() * 2.0));
    }

    #[test]
    fn test_turn_torque_is_cubic() {
        let cfg = SimConfig::default();
        assert!(approx(turn_torque(1.0, &cfg), 2.5));
        assert!(approx(turn_torque(2.0, &cfg), 20.0));
    }

    #[test]
    fn test_sprint_shrink_floors_at_min_scale() {
        let cfg = SimConfig::default();
        assert!(approx(sprint_shrink(2.0, 1.0, &cfg), 1.95));
        assert_eq!(sprint_shrink(1.0, 1.0, &cfg), 1.0);
        assert_eq!(sprint_shrink(1.01, 10.0, &cfg), 1.0);
    }

    #[test]
    fn test_growth_drains_proportionally_for_large_banks() {
        let cfg = SimConfig::default();
        let (used, scale) = growth_step(10.0, 1.0, 0.5, &cfg);
        assert!(approx(used, 0.5));
        assert!(approx(scale, 1.05));
    }

    #[test]
    fn test_growth_has_minimum_rate() {
        let cfg = SimConfig::default();
        let (used, _) = growth_step(0.2, 1.0, 1.0, &cfg);
        assert!(approx(used, 0.1));
    }

    #[test]
    fn test_growth_never_uses_more_than_banked() {
        let cfg = SimConfig::default();
        let (used, scale) = growth_step(0.01, 4.0, 1.0, &cfg);
        assert!(approx(used, 0.01));
        assert!(approx(scale, 4.0 + 0.01 * 0.1 / 2.0));
    }

    #[test]
    fn test_growth_without_food_is_noop() {
        let cfg = SimConfig::default();
        assert_eq!(growth_step(0.0, 1.3, 1.0, &cfg), (0.0, 1.3));
    }

    #[test]
    fn test_can_eat_boundary_is_exclusive() {
        // 1.5² == 1.0² * 2.25 exactly in binary floating point.
        assert!(!can_eat(1.5, 1.0, 2.25));
        assert!(can_eat(1.5001, 1.0, 2.25));
    }

    #[test]
    fn test_can_eat_default_ratio() {
        let ratio = SimConfig::default().predation_ratio;
        assert!(can_eat(1.2, 1.0, ratio)); // 1.44 > 1.4
        assert!(!can_eat(1.18, 1.0, ratio)); // 1.3924 < 1.4
        assert!(!can_eat(1.0, 1.0, ratio));
        assert!(!can_eat(1.0, 1.2, ratio));
    }

    #[test]
    fn test_control_up_pushes_along_heading() {
        let cfg = SimConfig::default();
        let input = InputFlags {
            up: true,
            ..Default::default()
        };
        let (force, torque) = duck_with(input, 1.0, std::f32::consts::FRAC_PI_2).control(&cfg);
        assert!(approx(force.x, 0.0));
        assert!(approx(force.y, 50.0));
        assert_eq!(torque, 0.0);
    }

    #[test]
    fn test_control_opposing_keys_prefer_up_and_left() {
        let cfg = SimConfig::default();
        let input = InputFlags {
            up: true,
            down: true,
            left: true,
            right: true,
            sprint: false,
        };
        let (force, torque) = duck_with(input, 1.0, 0.0).control(&cfg);
        assert!(approx(force.x, 50.0));
        assert!(approx(torque, 2.5));
    }

    #[test]
    fn test_control_down_right_reverses() {
        let cfg = SimConfig::default();
        let input = InputFlags::from_byte(InputFlags::DOWN | InputFlags::RIGHT);
        let (force, torque) = duck_with(input, 1.0, 0.0).control(&cfg);
        assert!(approx(force.x, -50.0));
        assert!(approx(torque, -2.5));
    }
}
