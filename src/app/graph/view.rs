use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::layout::SimulationState;
use crate::model::{Element, Graph, NodeId, display_text};

use super::super::render_utils::{
    arrow_head, blend_color, circle_visible, dim_color, draw_background, edge_visible,
    parse_color, world_to_screen,
};
use super::super::{SearchMatchCache, ViewModel};
use super::interaction::{edge_at, node_at};
use super::{ScreenEdge, ScreenNode};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Nodes whose caption fuzzy-matches `query`, best match first.
pub(in crate::app) fn search_nodes(
    graph: &Graph,
    display_keys: &[String],
    query: &str,
) -> Vec<(NodeId, i64)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let matcher = SkimMatcherV2::default();
    let mut matches = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            fuzzy_match_score(&matcher, display_text(node, display_keys), query)
                .map(|score| (node.id(), score))
        })
        .collect::<Vec<_>>();
    matches.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    matches
}

impl ViewModel {
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<NodeId>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(
            search_nodes(&self.graph, &self.display_keys, query)
                .into_iter()
                .map(|(id, _)| id)
                .collect::<HashSet<_>>(),
        );
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn screen_nodes(&self, rect: egui::Rect) -> Vec<ScreenNode> {
        let radius = (self.layout.config().node_size * self.zoom).clamp(2.5, 40.0);
        self.graph
            .nodes()
            .iter()
            .filter(|node| node.visible())
            .filter_map(|node| {
                let world = self.layout.position(node.id())?;
                Some(ScreenNode {
                    id: node.id(),
                    position: world_to_screen(rect, self.pan, self.zoom, world),
                    radius,
                })
            })
            .collect()
    }

    fn screen_edges(&self, rect: egui::Rect) -> Vec<ScreenEdge> {
        self.graph
            .edges()
            .iter()
            .filter(|edge| edge.visible() && !edge.is_self_loop())
            .filter_map(|edge| {
                let start = self.layout.position(edge.source())?;
                let end = self.layout.position(edge.target())?;
                let start = world_to_screen(rect, self.pan, self.zoom, start);
                let end = world_to_screen(rect, self.pan, self.zoom, end);
                edge_visible(rect, start, end, 2.5).then_some(ScreenEdge {
                    id: edge.id(),
                    start,
                    end,
                })
            })
            .collect()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        let state = self.layout.tick();
        if state == SimulationState::Running || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        self.handle_graph_zoom(ui, rect, &response);
        let screen_nodes = self.screen_nodes(rect);
        self.handle_node_drag(rect, &response, &screen_nodes);
        self.handle_graph_pan(&response);

        let screen_edges = self.screen_edges(rect);
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered_node = pointer.and_then(|pointer| node_at(&screen_nodes, pointer));
        let hovered_edge = match (hovered_node, pointer) {
            (None, Some(pointer)) => edge_at(&screen_edges, pointer),
            _ => None,
        };
        if hovered_node.is_some() || hovered_edge.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.selected = hovered_node
                .map(Element::Node)
                .or(hovered_edge.map(Element::Edge));
        }

        if self.selected.is_some()
            && !ui.ctx().wants_keyboard_input()
            && ui.input(|input| input.key_pressed(egui::Key::Delete))
        {
            self.delete_selected();
            return;
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches.is_some();
        let (selected_node, selected_edge) = match self.selected {
            Some(Element::Node(id)) => (Some(id), None),
            Some(Element::Edge(id)) => (None, Some(id)),
            None => (None, None),
        };
        let zoom_sqrt = self.zoom.sqrt();

        let mut visible_edge_count = 0usize;
        for screen_edge in &screen_edges {
            let Some(edge) = self.graph.edge(screen_edge.id) else {
                continue;
            };
            let base = parse_color(edge.color());
            let incident = selected_node
                .is_some_and(|id| edge.source() == id || edge.target() == id);
            let highlighted = incident
                || selected_edge == Some(edge.id())
                || hovered_edge == Some(edge.id());
            let color = if highlighted {
                blend_color(base, SELECTED_COLOR, 0.35)
            } else if selected_node.is_some() || search_active {
                dim_color(base, 0.45)
            } else {
                base
            };
            let width = if highlighted {
                (2.2 * zoom_sqrt).clamp(1.2, 4.4)
            } else {
                (1.1 * zoom_sqrt).clamp(0.6, 3.0)
            };

            let target_radius = screen_nodes
                .iter()
                .find(|node| node.id == edge.target())
                .map_or(0.0, |node| node.radius);
            let direction = screen_edge.end - screen_edge.start;
            let length = direction.length();
            let tip = if length > target_radius {
                screen_edge.end - direction / length * target_radius
            } else {
                screen_edge.end
            };
            painter.line_segment([screen_edge.start, tip], Stroke::new(width, color));
            if self.zoom > 0.5 {
                painter.add(Shape::convex_polygon(
                    arrow_head(tip, direction, 4.0 + width * 1.5).to_vec(),
                    color,
                    Stroke::NONE,
                ));
            }
            visible_edge_count += 1;
        }

        for edge in self.graph.edges() {
            if !edge.visible() || !edge.is_self_loop() {
                continue;
            }
            let Some(world) = self.layout.position(edge.source()) else {
                continue;
            };
            let center = world_to_screen(rect, self.pan, self.zoom, world);
            let loop_radius = (self.layout.config().node_size * self.zoom).clamp(2.5, 40.0);
            let loop_center = center - vec2(0.0, loop_radius * 1.6);
            if circle_visible(rect, loop_center, loop_radius) {
                painter.circle_stroke(
                    loop_center,
                    loop_radius,
                    Stroke::new((1.1 * zoom_sqrt).clamp(0.6, 3.0), parse_color(edge.color())),
                );
                visible_edge_count += 1;
            }
        }
        self.visible_edge_count = visible_edge_count;

        let mut visible_node_count = 0usize;
        let mut selection_animating = false;
        for screen_node in &screen_nodes {
            if !circle_visible(rect, screen_node.position, screen_node.radius) {
                continue;
            }
            let Some(node) = self.graph.node(screen_node.id) else {
                continue;
            };
            visible_node_count += 1;

            let is_selected = selected_node == Some(node.id());
            let is_hovered = hovered_node == Some(node.id());
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&node.id()));

            let base = parse_color(node.color());
            let unselected = if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(base, MATCH_COLOR, 0.6)
            } else if search_active || selected_node.is_some() {
                dim_color(base, 0.5)
            } else {
                base
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id().0)),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            let color = blend_color(unselected, SELECTED_COLOR, selection_mix);

            let position = screen_node.position;
            let radius = screen_node.radius;
            if node.is_placeholder() {
                painter.circle_filled(position, radius, Color32::from_rgb(24, 25, 32));
                painter.circle_stroke(position, radius, Stroke::new(1.5, color));
            } else {
                painter.circle_filled(position, radius, color);
                painter.circle_stroke(
                    position,
                    radius,
                    Stroke::new(
                        1.0 + selection_mix * 1.2,
                        Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                    ),
                );
            }
            if selection_mix > 0.0 {
                painter.circle_stroke(
                    position,
                    radius + 4.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(1.4, Color32::from_rgba_unmultiplied(245, 206, 93, 150)),
                );
            }

            if is_selected || is_hovered || (is_match && self.zoom > 0.35) || self.zoom > 1.35 {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    display_text(node, &self.display_keys),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
        self.visible_node_count = visible_node_count;

        if selection_animating {
            ui.ctx().request_repaint();
        }

        let hover_text = if let Some(id) = hovered_node
            && let Some(node) = self.graph.node(id)
        {
            Some(format!(
                "{}  |  {}  |  id {}  |  degree {}",
                display_text(node, &self.display_keys),
                if node.is_placeholder() {
                    "(unresolved)"
                } else {
                    node.category()
                },
                node.id(),
                self.layout.degree(id)
            ))
        } else if let Some(id) = hovered_edge
            && let Some(edge) = self.graph.edge(id)
        {
            Some(format!(
                "{}  |  {} -> {}",
                edge.relationship(),
                edge.source(),
                edge.target()
            ))
        } else {
            None
        };
        if let Some(text) = hover_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    /// Pans so that `id` sits in the middle of the canvas.
    pub(in crate::app) fn focus_node(&mut self, id: NodeId) {
        if let Some(world) = self.layout.position(id) {
            self.pan = -(world * self.zoom);
            self.selected = Some(Element::Node(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{Palette, QueryResult, default_display_keys};

    #[test]
    fn search_ranks_captions_and_ignores_blank_queries() {
        let result: QueryResult = serde_json::from_value(json!({"data": [
            {"n": {"id": 1, "labels": ["Person"], "properties": {"name": "Ada Lovelace"}}},
            {"n": {"id": 2, "labels": ["Person"], "properties": {"name": "Alan Turing"}}},
            {"n": {"id": 3, "labels": ["City"], "properties": {"title": "London"}}}
        ]}))
        .expect("valid batch");
        let mut graph = Graph::new("g", Palette::default());
        graph.extend(&result, false);
        let keys = default_display_keys();

        let hits = search_nodes(&graph, &keys, "turing");
        assert_eq!(hits.first().map(|(id, _)| *id), Some(NodeId(2)));
        assert!(hits.iter().all(|(id, _)| *id != NodeId(3)));
        assert_eq!(
            search_nodes(&graph, &keys, "london")
                .into_iter()
                .map(|(id, _)| id)
                .collect::<Vec<_>>(),
            vec![NodeId(3)]
        );
        assert!(search_nodes(&graph, &keys, "   ").is_empty());
    }
}
