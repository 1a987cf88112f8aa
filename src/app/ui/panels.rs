use eframe::egui::{self, Align, Context, Layout, RichText, Ui};

use crate::layout::SimulationState;
use crate::model::{GroupKind, NodeId, display_text};

use super::super::ViewModel;
use super::super::graph::search_nodes;
use super::super::render_utils::parse_color;

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, reset_requested: &mut bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graph-lens");
                    ui.separator();
                    ui.label(format!("graph: {}", self.graph.name()));
                    ui.label(format!("nodes: {}", self.graph.nodes().len()));
                    ui.label(format!("edges: {}", self.graph.edges().len()));
                    ui.label(format!(
                        "groups: {} / {}",
                        self.graph.categories().len(),
                        self.graph.relationships().len()
                    ));
                    ui.label(format!("batches: {}", self.batches_applied));
                    if self.is_streaming() {
                        ui.spinner();
                    }
                    if ui.button("Reset graph").clicked() {
                        *reset_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "in view: {} nodes, {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        self.draw_search(ui);
        ui.separator();
        self.draw_layout_controls(ui);
        ui.separator();
        self.draw_groups(ui, GroupKind::Category);
        ui.separator();
        self.draw_groups(ui, GroupKind::Relationship);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("fuzzy match on captions")
                .desired_width(f32::INFINITY),
        );

        let hits = search_nodes(&self.graph, &self.display_keys, &self.search);
        if self.search.trim().is_empty() {
            return;
        }
        if hits.is_empty() {
            ui.weak("No matching nodes.");
            return;
        }

        let mut focus: Option<NodeId> = None;
        for (id, _score) in hits.iter().take(SEARCH_RESULT_ROWS) {
            let Some(node) = self.graph.node(*id) else {
                continue;
            };
            let text = format!("{}  ({})", display_text(node, &self.display_keys), id);
            if ui.selectable_label(false, text).clicked() {
                focus = Some(*id);
            }
        }
        if hits.len() > SEARCH_RESULT_ROWS {
            ui.weak(format!("... and {} more", hits.len() - SEARCH_RESULT_ROWS));
        }
        if let Some(id) = focus {
            self.focus_node(id);
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Layout").strong());
        let state = self.layout.state();
        ui.label(format!(
            "state: {}  |  alpha {:.3}  |  ticks {}",
            state.label(),
            self.layout.alpha(),
            self.layout.ticks()
        ));

        ui.horizontal(|ui| {
            if ui
                .add_enabled(state != SimulationState::Idle, egui::Button::new("Reheat"))
                .clicked()
            {
                self.layout.reheat();
            }
            if ui
                .add_enabled(state == SimulationState::Running, egui::Button::new("Pause"))
                .clicked()
            {
                self.layout.pause();
            }
        });

        let mut bounded = self.layout.cooldown_ticks().is_some();
        let mut budget = self.layout.cooldown_ticks().unwrap_or(300);
        ui.horizontal(|ui| {
            let toggled = ui.checkbox(&mut bounded, "Tick budget").changed();
            let dragged = ui
                .add_enabled(bounded, egui::DragValue::new(&mut budget).range(0..=10_000))
                .changed();
            if toggled || dragged {
                self.layout.set_cooldown_ticks(bounded.then_some(budget));
            }
        });
    }

    fn draw_groups(&mut self, ui: &mut Ui, kind: GroupKind) {
        let groups = self.graph.groups(kind);
        let heading = match kind {
            GroupKind::Category => "Categories",
            GroupKind::Relationship => "Relationships",
        };
        ui.label(RichText::new(format!("{heading} ({})", groups.len())).strong());
        if groups.is_empty() {
            ui.weak("None yet.");
            return;
        }

        let mut toggled = None;
        for group in groups.iter() {
            let color = parse_color(
                self.graph
                    .group_color(kind, &group.name)
                    .unwrap_or_default(),
            );
            ui.horizontal(|ui| {
                let mut show = group.show;
                if ui.checkbox(&mut show, "").changed() {
                    toggled = Some((group.name.clone(), show));
                }
                ui.label(RichText::new("●").color(color));
                let name = if group.name.is_empty() {
                    "(no label)"
                } else {
                    group.name.as_str()
                };
                ui.label(name);
            });
        }

        if let Some((name, show)) = toggled {
            self.graph.set_group_visibility(kind, &name, show);
            self.graph_revision += 1;
        }
    }
}
