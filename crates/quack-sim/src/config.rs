//! Gameplay tuning.

/// Tunables for the simulation rules.
///
/// The defaults are the values the game is balanced around; tests override
/// individual fields with struct-update syntax.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Ducks and food spawn uniformly in `[-spawn_extent, spawn_extent]` on
    /// both axes. Keeps spawns clear of the 200×200 arena's walls.
    pub spawn_extent: f32,
    /// Number of food items kept alive at all times.
    pub food_count: usize,
    /// Base forward/backward force, multiplied by `scale * sqrt(scale)`.
    pub move_force: f32,
    /// Base turning torque, multiplied by `scale³`.
    pub turn_torque: f32,
    /// Scale never drops below this.
    pub min_scale: f32,
    /// Sprinting removes `sprint_shrink_rate / scale` scale per second.
    pub sprint_shrink_rate: f32,
    /// Predation needs `predator² > prey² * predation_ratio`.
    pub predation_ratio: f32,
    /// Fraction of banked food converted to growth per second.
    pub growth_rate: f32,
    /// Scale gained per unit of food, before the `1 / sqrt(scale)` falloff.
    pub growth_factor: f32,
    /// Food credit gained per food item.
    pub food_value: f32,
    /// Game seconds per real second for the in-game clock.
    pub time_scale: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spawn_extent: 90.0,
            food_count: 50,
            move_force: 50.0,
            turn_torque: 2.5,
            min_scale: 1.0,
            sprint_shrink_rate: 0.1,
            predation_ratio: 1.4,
            growth_rate: 0.1,
            growth_factor: 0.1,
            food_value: 1.0,
            // 5 game minutes per real second.
            time_scale: 300.0,
        }
    }
}
