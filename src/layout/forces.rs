use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const DISTANCE_MIN_SQ: f32 = 1.0;
const JIGGLE_SCALE: f32 = 1e-6;

/// Spring between two bodies, by index into the body list.
#[derive(Clone, Copy, Debug)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    /// Share of the correction taken by the target. Lighter ends move more.
    pub(super) bias: f32,
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta_sq: f32,
}

/// Tiny deterministic nudge for coincident bodies, spread on the golden angle.
pub(super) fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * JIGGLE_SCALE
}

fn non_zero(delta: Vec2, a: usize, b: usize) -> Vec2 {
    if delta == Vec2::ZERO { jiggle(a, b) } else { delta }
}

pub(super) fn apply_links(
    springs: &[Spring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for spring in springs {
        let Spring {
            source, target, ..
        } = *spring;
        let delta = non_zero(
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]),
            source,
            target,
        );
        let length = delta.length();
        let correction = delta * ((length - spring.distance) / length * alpha * spring.strength);
        velocities[target] -= correction * spring.bias;
        velocities[source] += correction * (1.0 - spring.bias);
    }
}

pub(super) fn apply_charge(
    tree: &QuadNode,
    positions: &[Vec2],
    velocities: &mut [Vec2],
    params: ChargeParams,
    alpha: f32,
) {
    for index in 0..positions.len() {
        let mut impulse = Vec2::ZERO;
        accumulate_charge(tree, index, positions, params, alpha, &mut impulse);
        velocities[index] += impulse;
    }
}

fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    alpha: f32,
    impulse: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let delta = non_zero(positions[other] - point, index, other);
            let mut distance_sq = delta.length_sq();
            if distance_sq >= params.distance_max_sq {
                continue;
            }
            if distance_sq < DISTANCE_MIN_SQ {
                distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
            }
            *impulse += delta * (params.strength * alpha / distance_sq);
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let distance_sq = delta.length_sq();
    let width = node.bounds.side_length();
    if !node.bounds.contains(point) && width * width / params.theta_sq < distance_sq {
        if distance_sq < params.distance_max_sq {
            let distance_sq = if distance_sq < DISTANCE_MIN_SQ {
                (DISTANCE_MIN_SQ * distance_sq).sqrt()
            } else {
                distance_sq
            };
            *impulse += delta * (params.strength * node.mass * alpha / distance_sq);
        }
        return;
    }

    if node.bounds.distance_sq_to_point(point) >= params.distance_max_sq {
        return;
    }

    for child in node.children() {
        accumulate_charge(child, index, positions, params, alpha, impulse);
    }
}

/// Pushes overlapping bodies apart, heavier (larger) bodies moving less.
/// Works on predicted positions and is not scaled by alpha.
pub(super) fn apply_collision(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    radii: &[f32],
    strength: f32,
    iterations: usize,
) {
    let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
    let reach_sq = (max_radius * 2.0) * (max_radius * 2.0);

    for _ in 0..iterations {
        let predicted = positions
            .iter()
            .zip(velocities.iter())
            .map(|(position, velocity)| *position + *velocity)
            .collect::<Vec<_>>();
        let Some(tree) = QuadNode::build(&predicted) else {
            return;
        };

        for_each_close_pair(&tree, &tree, true, reach_sq, &mut |from, to| {
            let radius = radii[from] + radii[to];
            let delta = non_zero(predicted[from] - predicted[to], from, to);
            let distance_sq = delta.length_sq();
            if distance_sq >= radius * radius {
                return;
            }
            let distance = distance_sq.sqrt();
            let push = delta * ((radius - distance) / distance * strength);
            let from_sq = radii[from] * radii[from];
            let to_sq = radii[to] * radii[to];
            let share = to_sq / (from_sq + to_sq);
            velocities[from] += push * share;
            velocities[to] -= push * (1.0 - share);
        });
    }
}

/// Visits each unordered pair of bodies whose cells lie within `reach_sq`.
fn for_each_close_pair(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    reach_sq: f32,
    visit: &mut impl FnMut(usize, usize),
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    visit(from, to);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    visit(from, to);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            for_each_close_pair(child_a, child_a, true, reach_sq, visit);
            for child_b in &children[offset + 1..] {
                for_each_close_pair(child_a, child_b, false, reach_sq, visit);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            for_each_close_pair(child, node_b, false, reach_sq, visit);
        }
    } else {
        for child in node_b.children() {
            for_each_close_pair(node_a, child, false, reach_sq, visit);
        }
    }
}

/// Shifts every body so the centroid moves towards `center`.
pub(super) fn apply_center(positions: &mut [Vec2], center: Vec2, strength: f32) {
    if positions.is_empty() {
        return;
    }
    let centroid = positions
        .iter()
        .fold(Vec2::ZERO, |sum, position| sum + *position)
        / positions.len() as f32;
    let shift = (centroid - center) * strength;
    for position in positions {
        *position -= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spring(distance: f32) -> Spring {
        Spring {
            source: 0,
            target: 1,
            distance,
            strength: 1.0,
            bias: 0.5,
        }
    }

    #[test]
    fn stretched_spring_pulls_ends_together() {
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_links(&[spring(50.0)], &positions, &mut velocities, 1.0);
        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
        assert!((velocities[0].x + velocities[1].x).abs() < 1e-4);
    }

    #[test]
    fn spring_bias_moves_lighter_end_more() {
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        let biased = Spring {
            bias: 0.9,
            ..spring(50.0)
        };
        apply_links(&[biased], &positions, &mut velocities, 1.0);
        assert!(velocities[1].x.abs() > velocities[0].x.abs() * 5.0);
    }

    #[test]
    fn charge_repels_within_cutoff_only() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(1000.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 3];
        let tree = QuadNode::build(&positions).expect("finite");
        let params = ChargeParams {
            strength: -5.0,
            distance_max_sq: 300.0 * 300.0,
            theta_sq: 0.81,
        };
        apply_charge(&tree, &positions, &mut velocities, params, 1.0);
        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert_eq!(velocities[2], Vec2::ZERO);
    }

    #[test]
    fn collision_separates_overlapping_bodies() {
        let positions = [vec2(0.0, 0.0), vec2(4.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        apply_collision(&positions, &mut velocities, &[12.0, 12.0], 1.0, 1);
        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);

        let mut untouched = [Vec2::ZERO; 2];
        apply_collision(
            &[vec2(0.0, 0.0), vec2(40.0, 0.0)],
            &mut untouched,
            &[12.0, 12.0],
            1.0,
            2,
        );
        assert_eq!(untouched, [Vec2::ZERO; 2]);
    }

    #[test]
    fn coincident_bodies_get_pushed_apart() {
        let positions = [Vec2::ZERO; 3];
        let mut velocities = [Vec2::ZERO; 3];
        apply_collision(&positions, &mut velocities, &[12.0; 3], 1.0, 1);
        assert!(velocities.iter().any(|velocity| velocity.length() > 1.0));
    }

    #[test]
    fn close_pairs_cover_every_pair_once() {
        let positions = (0..40)
            .map(|i| vec2((i % 8) as f32 * 3.0, (i / 8) as f32 * 3.0))
            .collect::<Vec<_>>();
        let tree = QuadNode::build(&positions).expect("finite");
        let mut seen = std::collections::HashSet::new();
        for_each_close_pair(&tree, &tree, true, f32::INFINITY, &mut |a, b| {
            assert!(seen.insert((a.min(b), a.max(b))));
        });
        assert_eq!(seen.len(), 40 * 39 / 2);
    }

    #[test]
    fn center_moves_centroid_towards_origin() {
        let mut positions = [vec2(10.0, 10.0), vec2(30.0, 10.0)];
        apply_center(&mut positions, Vec2::ZERO, 0.5);
        assert_eq!(positions, [vec2(0.0, 5.0), vec2(20.0, 5.0)]);
    }

    #[test]
    fn center_keeps_a_centered_cloud_in_place() {
        let mut positions = [vec2(-8.0, 3.0), vec2(8.0, -3.0), vec2(0.0, 0.0)];
        apply_center(&mut positions, Vec2::ZERO, 0.4);
        assert_eq!(positions, [vec2(-8.0, 3.0), vec2(8.0, -3.0), vec2(0.0, 0.0)]);

        let mut empty: [Vec2; 0] = [];
        apply_center(&mut empty, Vec2::ZERO, 0.4);
    }
}
