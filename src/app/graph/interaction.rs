use eframe::egui::{self, Pos2, Rect, Ui};

use crate::model::{EdgeId, NodeId};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;
use super::{ScreenEdge, ScreenNode};

const EDGE_PICK_DISTANCE: f32 = 4.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 8.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (self.dragging.is_none() && response.dragged_by(egui::PointerButton::Primary))
        {
            self.pan += response.drag_delta();
        }
    }

    /// Primary drag on a node pins it under the pointer until release.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        screen_nodes: &[ScreenNode],
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.dragging = node_at(screen_nodes, pointer);
        }

        let Some(id) = self.dragging else {
            return;
        };

        if response.drag_stopped() {
            self.layout.unpin(id);
            self.dragging = None;
            return;
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            self.layout.pin(id, world);
        }
    }
}

pub(super) fn node_at(screen_nodes: &[ScreenNode], pointer: Pos2) -> Option<NodeId> {
    screen_nodes
        .iter()
        .filter_map(|node| {
            let distance = node.position.distance(pointer);
            (distance <= node.radius.max(EDGE_PICK_DISTANCE)).then_some((node.id, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

pub(super) fn edge_at(screen_edges: &[ScreenEdge], pointer: Pos2) -> Option<EdgeId> {
    screen_edges
        .iter()
        .map(|edge| (edge.id, distance_to_segment(pointer, edge.start, edge.end)))
        .filter(|(_, distance)| *distance <= EDGE_PICK_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn picks_closest_node_under_pointer() {
        let nodes = [
            ScreenNode {
                id: NodeId(1),
                position: pos2(10.0, 10.0),
                radius: 8.0,
            },
            ScreenNode {
                id: NodeId(2),
                position: pos2(16.0, 10.0),
                radius: 8.0,
            },
        ];
        assert_eq!(node_at(&nodes, pos2(14.0, 10.0)), Some(NodeId(2)));
        assert_eq!(node_at(&nodes, pos2(100.0, 10.0)), None);
    }

    #[test]
    fn picks_edges_near_the_segment_only() {
        let edges = [ScreenEdge {
            id: EdgeId(3),
            start: pos2(0.0, 0.0),
            end: pos2(100.0, 0.0),
        }];
        assert_eq!(edge_at(&edges, pos2(50.0, 3.0)), Some(EdgeId(3)));
        assert_eq!(edge_at(&edges, pos2(50.0, 9.0)), None);
        assert_eq!(edge_at(&edges, pos2(110.0, 0.0)), None);
    }
}
