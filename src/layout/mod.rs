//! Degree-adaptive force layout.
//!
//! [`LayoutEngine`] owns one body per graph node and advances a velocity
//! simulation one [`LayoutEngine::tick`] at a time. Every call to
//! [`LayoutEngine::configure`] recomputes node degrees, rebuilds the springs
//! and collision radii from them, keeps the positions of bodies that survive
//! and reheats the simulation.

mod config;
mod degree;
mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, trace};

use crate::model::{GraphData, NodeId};
use crate::util::stable_pair;

pub use config::LayoutConfig;
pub use degree::DegreeMap;
use forces::{ChargeParams, Spring};
use quadtree::QuadNode;

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    /// Nothing to simulate.
    Idle,
    Running,
    /// Cooled down, out of tick budget, or paused.
    Settled,
}

impl SimulationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Settled => "settled",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: NodeId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
    pub radius: f32,
    pub degree: u32,
}

pub struct LayoutEngine {
    config: LayoutConfig,
    bodies: Vec<Body>,
    index_by_id: HashMap<NodeId, usize>,
    springs: Vec<Spring>,
    degrees: DegreeMap,
    state: SimulationState,
    alpha: f32,
    ticks: u32,
    cooldown_ticks: Option<u32>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let cooldown_ticks = config.cooldown_ticks;
        Self {
            config,
            bodies: Vec::new(),
            index_by_id: HashMap::new(),
            springs: Vec::new(),
            degrees: DegreeMap::default(),
            state: SimulationState::Idle,
            alpha: 0.0,
            ticks: 0,
            cooldown_ticks,
            positions: Vec::new(),
            velocities: Vec::new(),
            radii: Vec::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Re-derives every force from the current snapshot and reheats.
    ///
    /// Bodies are matched by node id, so surviving nodes keep their position
    /// and velocity. New nodes start next to an already placed neighbour when
    /// there is one.
    pub fn configure(&mut self, data: GraphData<'_>) {
        if data.nodes.is_empty() {
            self.bodies.clear();
            self.index_by_id.clear();
            self.springs.clear();
            self.degrees = DegreeMap::default();
            self.alpha = 0.0;
            self.ticks = 0;
            self.state = SimulationState::Idle;
            debug!("layout configured without nodes, staying idle");
            return;
        }

        let mut previous = self
            .bodies
            .drain(..)
            .map(|body| (body.id, body))
            .collect::<HashMap<_, _>>();
        self.degrees = DegreeMap::from_links(data.nodes, data.links);

        self.index_by_id = data
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();

        let mut neighbours = vec![Vec::new(); data.nodes.len()];
        for link in data.links {
            let (Some(&source), Some(&target)) = (
                self.index_by_id.get(&link.source()),
                self.index_by_id.get(&link.target()),
            ) else {
                continue;
            };
            if source != target {
                neighbours[source].push(target);
                neighbours[target].push(source);
            }
        }

        let mut placed = Vec::with_capacity(data.nodes.len());
        let mut fresh = Vec::new();
        for (index, node) in data.nodes.iter().enumerate() {
            let id = node.id();
            let degree = self.degrees.get(id);
            let radius = self.config.collision_radius_for(degree);
            let body = match previous.remove(&id) {
                Some(body) => {
                    placed.push(true);
                    Body {
                        radius,
                        degree,
                        ..body
                    }
                }
                None => {
                    placed.push(false);
                    fresh.push(index);
                    Body {
                        id,
                        position: Vec2::ZERO,
                        velocity: Vec2::ZERO,
                        pinned: None,
                        radius,
                        degree,
                    }
                }
            };
            self.bodies.push(body);
        }

        for &index in &fresh {
            let anchor = neighbours[index]
                .iter()
                .copied()
                .find(|&neighbour| placed[neighbour]);
            let position = match anchor {
                Some(anchor) => {
                    let (jx, jy) = stable_pair(&self.bodies[index].id.to_string());
                    let direction = vec2(jx, jy);
                    let direction = if direction.length_sq() > 1e-6 {
                        direction.normalized()
                    } else {
                        vec2(1.0, 0.0)
                    };
                    self.bodies[anchor].position + direction * self.config.link_distance
                }
                None => phyllotaxis(index),
            };
            self.bodies[index].position = position;
            placed[index] = true;
        }

        self.springs = data
            .links
            .iter()
            .filter_map(|link| {
                let source = *self.index_by_id.get(&link.source())?;
                let target = *self.index_by_id.get(&link.target())?;
                if source == target {
                    return None;
                }
                let source_degree = self.degrees.get(link.source());
                let target_degree = self.degrees.get(link.target());
                let max_degree = source_degree.max(target_degree);
                Some(Spring {
                    source,
                    target,
                    distance: self.config.link_distance_for(max_degree),
                    strength: self.config.link_strength_for(max_degree),
                    bias: source_degree as f32 / (source_degree + target_degree) as f32,
                })
            })
            .collect();

        debug!(
            nodes = self.bodies.len(),
            springs = self.springs.len(),
            new_bodies = fresh.len(),
            max_degree = self.degrees.max(),
            "layout configured"
        );
        self.reheat();
    }

    /// Restarts the simulation at full heat with a fresh tick budget.
    pub fn reheat(&mut self) {
        if self.bodies.is_empty() {
            self.state = SimulationState::Idle;
            return;
        }
        self.alpha = 1.0;
        self.ticks = 0;
        self.state = if self.cooldown_ticks == Some(0) {
            SimulationState::Settled
        } else {
            SimulationState::Running
        };
    }

    pub fn pause(&mut self) {
        if self.state == SimulationState::Running {
            self.state = SimulationState::Settled;
        }
    }

    /// `Some(0)` stops a running simulation on the spot.
    pub fn set_cooldown_ticks(&mut self, cooldown_ticks: Option<u32>) {
        self.cooldown_ticks = cooldown_ticks;
        if self.state == SimulationState::Running
            && cooldown_ticks.is_some_and(|budget| self.ticks >= budget)
        {
            self.state = SimulationState::Settled;
        }
    }

    pub fn cooldown_ticks(&self) -> Option<u32> {
        self.cooldown_ticks
    }

    /// Advances one step while running. Other states are left alone.
    pub fn tick(&mut self) -> SimulationState {
        if self.state != SimulationState::Running {
            return self.state;
        }

        self.alpha += (self.config.alpha_target - self.alpha) * self.config.alpha_decay;
        self.step();
        self.ticks += 1;

        let out_of_budget = self
            .cooldown_ticks
            .is_some_and(|budget| self.ticks >= budget);
        if self.alpha < self.config.alpha_min || out_of_budget {
            self.state = SimulationState::Settled;
            debug!(ticks = self.ticks, alpha = self.alpha, "layout settled");
        }
        self.state
    }

    fn step(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.radii.clear();
        for body in &self.bodies {
            self.positions.push(body.position);
            self.velocities.push(body.velocity);
            self.radii.push(body.radius);
        }

        forces::apply_links(
            &self.springs,
            &self.positions,
            &mut self.velocities,
            self.alpha,
        );

        if let Some(tree) = QuadNode::build(&self.positions) {
            forces::apply_charge(
                &tree,
                &self.positions,
                &mut self.velocities,
                ChargeParams {
                    strength: self.config.charge_strength,
                    distance_max_sq: self.config.charge_distance_max
                        * self.config.charge_distance_max,
                    theta_sq: self.config.theta * self.config.theta,
                },
                self.alpha,
            );
        } else {
            trace!("skipping charge, positions are not finite");
        }

        forces::apply_collision(
            &self.positions,
            &mut self.velocities,
            &self.radii,
            self.config.collision_strength,
            self.config.collision_iterations,
        );
        forces::apply_center(
            &mut self.positions,
            Vec2::ZERO,
            self.config.center_strength,
        );

        let retain = 1.0 - self.config.velocity_decay;
        for ((body, position), velocity) in self
            .bodies
            .iter_mut()
            .zip(&self.positions)
            .zip(&self.velocities)
        {
            match body.pinned {
                Some(pin) => {
                    body.position = pin;
                    body.velocity = Vec2::ZERO;
                }
                None => {
                    body.velocity = *velocity * retain;
                    body.position = *position + body.velocity;
                }
            }
        }
    }

    /// Holds a body at `position` and keeps the simulation warm around it.
    pub fn pin(&mut self, id: NodeId, position: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(&id) else {
            return false;
        };
        let body = &mut self.bodies[index];
        body.pinned = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        if self.cooldown_ticks != Some(0) {
            self.alpha = self.alpha.max(self.config.drag_alpha);
            self.ticks = 0;
            self.state = SimulationState::Running;
        }
        true
    }

    pub fn unpin(&mut self, id: NodeId) -> bool {
        let Some(&index) = self.index_by_id.get(&id) else {
            return false;
        };
        self.bodies[index].pinned.take().is_some()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: NodeId) -> Option<&Body> {
        self.index_by_id.get(&id).map(|&index| &self.bodies[index])
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    pub fn degree(&self, id: NodeId) -> u32 {
        self.degrees.get(id)
    }

    pub fn radius(&self, id: NodeId) -> Option<f32> {
        self.body(id).map(|body| body.radius)
    }

    /// Rest length the spring between `source` and `target` would get.
    pub fn link_distance(&self, source: NodeId, target: NodeId) -> f32 {
        self.config
            .link_distance_for(self.degrees.max_endpoint(source, target))
    }

    pub fn link_strength(&self, source: NodeId, target: NodeId) -> f32 {
        self.config
            .link_strength_for(self.degrees.max_endpoint(source, target))
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

/// Sunflower spiral, the same seeding an unplaced body gets in d3.
fn phyllotaxis(index: usize) -> Vec2 {
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    vec2(angle.cos(), angle.sin()) * radius
}
