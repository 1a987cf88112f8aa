use eframe::egui::{self, RichText, Ui};
use serde_json::Value;

use crate::model::{Element, GroupKind, NodeId, Properties, display_text};

use super::super::ViewModel;
use super::super::render_utils::parse_color;

enum DetailsAction {
    Select(NodeId),
    Delete,
    Collapse,
    Unpin(NodeId),
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn draw_properties(ui: &mut Ui, id_salt: impl std::hash::Hash, properties: &Properties) {
    if properties.is_empty() {
        ui.weak("No properties.");
        return;
    }
    egui::Grid::new(id_salt)
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            for (key, value) in properties {
                ui.label(RichText::new(key).monospace());
                ui.label(property_text(value));
                ui.end_row();
            }
        });
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let action = match self.selected {
            None => {
                ui.label("Click a node or an edge in the graph.");
                None
            }
            Some(Element::Node(id)) => self.draw_node_details(ui, id),
            Some(Element::Edge(id)) => {
                let Some(edge) = self.graph.edge(id) else {
                    ui.label("The selected edge is no longer in the graph.");
                    return;
                };
                let mut action = None;
                ui.label(
                    RichText::new(edge.relationship())
                        .strong()
                        .color(parse_color(edge.color())),
                );
                ui.small(format!("edge {}", edge.id()));
                ui.horizontal(|ui| {
                    ui.label("from");
                    if ui.link(edge.source().to_string()).clicked() {
                        action = Some(DetailsAction::Select(edge.source()));
                    }
                    ui.label("to");
                    if ui.link(edge.target().to_string()).clicked() {
                        action = Some(DetailsAction::Select(edge.target()));
                    }
                });
                ui.label(format!(
                    "spring: rest length {:.1}, strength {:.2}",
                    self.layout.link_distance(edge.source(), edge.target()),
                    self.layout.link_strength(edge.source(), edge.target())
                ));
                if edge.collapsed() {
                    ui.weak("loaded as a neighbour expansion");
                }
                ui.add_space(4.0);
                draw_properties(ui, ("edge-properties", id.0), edge.properties());
                ui.add_space(6.0);
                if ui.button("Delete edge").clicked() {
                    action = Some(DetailsAction::Delete);
                }
                action
            }
        };

        match action {
            Some(DetailsAction::Select(id)) => self.focus_node(id),
            Some(DetailsAction::Delete) => self.delete_selected(),
            Some(DetailsAction::Collapse) => self.collapse_selected(),
            Some(DetailsAction::Unpin(id)) => {
                self.layout.unpin(id);
            }
            None => {}
        }

        ui.separator();
        self.draw_result_summary(ui);
    }

    fn draw_node_details(&self, ui: &mut Ui, id: NodeId) -> Option<DetailsAction> {
        let Some(node) = self.graph.node(id) else {
            ui.label("The selected node is no longer in the graph.");
            return None;
        };

        let mut action = None;
        ui.label(
            RichText::new(display_text(node, &self.display_keys))
                .strong()
                .color(parse_color(node.color())),
        );
        ui.small(format!("node {}", node.id()));
        if node.is_placeholder() {
            ui.weak("Only known as an edge endpoint so far.");
        } else {
            ui.label(format!(
                "{}: {}",
                GroupKind::Category.label(),
                node.category()
            ));
            if node.labels().len() > 1 {
                ui.label(format!("labels: {}", node.labels().join(", ")));
            }
        }
        ui.label(format!("degree: {}", self.layout.degree(id)));
        if let Some(radius) = self.layout.radius(id) {
            ui.label(format!("collision radius: {radius:.1}"));
        }
        if let Some(body) = self.layout.body(id) {
            ui.label(format!(
                "position: ({:.0}, {:.0})",
                body.position.x, body.position.y
            ));
            if body.pinned.is_some() && ui.button("Unpin").clicked() {
                action = Some(DetailsAction::Unpin(id));
            }
        }

        let neighbours = self.graph.neighbors(id);
        if !neighbours.is_empty() {
            ui.add_space(4.0);
            ui.label(RichText::new(format!("Neighbours ({})", neighbours.len())).strong());
            ui.horizontal_wrapped(|ui| {
                for neighbour in neighbours {
                    let caption = self
                        .graph
                        .node(neighbour)
                        .map_or_else(|| neighbour.to_string(), |node| {
                            display_text(node, &self.display_keys).to_owned()
                        });
                    if ui.link(caption).clicked() {
                        action = Some(DetailsAction::Select(neighbour));
                    }
                }
            });
        }

        ui.add_space(4.0);
        draw_properties(ui, ("node-properties", id.0), node.properties());
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Delete node").clicked() {
                action = Some(DetailsAction::Delete);
            }
            if node.expanded() && ui.button("Collapse neighbours").clicked() {
                action = Some(DetailsAction::Collapse);
            }
        });
        action
    }

    fn draw_result_summary(&self, ui: &mut Ui) {
        ui.label(RichText::new("Last batch").strong());
        let columns = self.graph.columns();
        if columns.is_empty() {
            ui.weak("No columns.");
        } else {
            ui.label(format!("columns: {}", columns.join(", ")));
        }
        for line in self.graph.metadata() {
            ui.small(line.as_str());
        }

        if !self.load_errors.is_empty() {
            ui.add_space(6.0);
            ui.label(RichText::new("Load errors").strong());
            for error in &self.load_errors {
                ui.colored_label(egui::Color32::from_rgb(237, 112, 112), error.as_str());
            }
        }
    }
}
