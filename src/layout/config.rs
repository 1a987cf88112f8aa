use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Tunables for the force layout. Any subset may be overridden from JSON.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Drawn node radius in world units.
    pub node_size: f32,
    /// Link distance `D` used while both endpoints are below the crowding threshold.
    pub link_distance: f32,
    /// Upper bound for adapted link distance.
    pub max_link_distance: f32,
    /// Extra distance per degree above the crowding threshold.
    pub distance_per_degree: f32,
    pub crowding_threshold: u32,
    /// Full spring strength `S`.
    pub link_strength: f32,
    /// Floor for softened springs `Smin`.
    pub min_link_strength: f32,
    /// Degree beyond which springs soften, also the decay scale.
    pub strength_decay: f32,
    pub collision_base_radius: f32,
    pub high_degree_padding: f32,
    pub collision_strength: f32,
    pub collision_iterations: usize,
    /// Negative values repel.
    pub charge_strength: f32,
    /// Bodies further apart than this do not interact through charge.
    pub charge_distance_max: f32,
    pub center_strength: f32,
    /// Barnes-Hut opening angle.
    pub theta: f32,
    pub alpha_min: f32,
    /// Fraction of the gap to `alpha_target` closed every tick.
    pub alpha_decay: f32,
    /// Alpha the simulation cools towards. Keep it below `alpha_min` so runs settle.
    pub alpha_target: f32,
    pub velocity_decay: f32,
    /// Alpha a drag keeps the simulation at.
    pub drag_alpha: f32,
    /// Tick budget per heat cycle; `None` runs until alpha cools down.
    pub cooldown_ticks: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let node_size = 6.0;
        let alpha_min = 0.001_f32;
        Self {
            node_size,
            link_distance: 50.0,
            max_link_distance: 80.0,
            distance_per_degree: 1.5,
            crowding_threshold: 20,
            link_strength: 0.5,
            min_link_strength: 0.3,
            strength_decay: 15.0,
            collision_base_radius: node_size * 2.0,
            high_degree_padding: 1.25,
            collision_strength: 1.35,
            collision_iterations: 2,
            charge_strength: -5.0,
            charge_distance_max: 300.0,
            center_strength: 0.4,
            theta: 0.9,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 0.4,
            drag_alpha: 0.3,
            cooldown_ticks: None,
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid layout config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.link_distance > 0.0, "link_distance must be positive");
        ensure!(
            self.max_link_distance >= self.link_distance,
            "max_link_distance must not be below link_distance"
        );
        ensure!(
            self.min_link_strength <= self.link_strength,
            "min_link_strength must not exceed link_strength"
        );
        ensure!(
            self.min_link_strength >= 0.0,
            "min_link_strength must not be negative"
        );
        ensure!(self.strength_decay > 0.0, "strength_decay must be positive");
        ensure!(
            self.collision_base_radius >= 0.0,
            "collision_base_radius must not be negative"
        );
        ensure!(
            self.collision_strength >= 0.0,
            "collision_strength must not be negative"
        );
        ensure!(
            self.charge_distance_max > 0.0,
            "charge_distance_max must be positive"
        );
        ensure!(
            (0.0..1.0).contains(&self.alpha_decay) && (0.0..=1.0).contains(&self.velocity_decay),
            "alpha_decay and velocity_decay must lie in [0, 1)"
        );
        ensure!(
            (0.0..=1.0).contains(&self.alpha_target),
            "alpha_target must lie in [0, 1]"
        );
        Ok(())
    }

    pub fn max_extra_distance(&self) -> f32 {
        self.max_link_distance - self.link_distance
    }
}
