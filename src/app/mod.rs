use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use crate::layout::{LayoutConfig, LayoutEngine};
use crate::model::{Element, Graph, NodeId, Palette, QueryResult, read_query_result};

mod graph;
mod render_utils;
mod ui;

/// Everything the viewer needs from the command line.
#[derive(Clone, Debug)]
pub struct Settings {
    pub files: Vec<PathBuf>,
    pub expansions: Vec<Expansion>,
    pub layout: LayoutConfig,
    pub palette: Palette,
    pub display_keys: Vec<String>,
    pub graph_name: String,
}

/// Neighbour batch for one node, merged as collapsed elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expansion {
    pub node: NodeId,
    pub file: PathBuf,
}

impl std::str::FromStr for Expansion {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (node, file) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected <node-id>=<file>, got `{raw}`"))?;
        let node = node
            .trim()
            .parse::<u64>()
            .map_err(|error| format!("invalid node id `{node}`: {error}"))?;
        if file.is_empty() {
            return Err("missing file after `=`".to_owned());
        }
        Ok(Self {
            node: NodeId(node),
            file: PathBuf::from(file),
        })
    }
}

enum LoadEvent {
    Batch {
        source: PathBuf,
        result: QueryResult,
        expands: Option<NodeId>,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

pub struct ExplorerApp {
    settings: Settings,
    state: AppState,
}

enum AppState {
    Loading { rx: Receiver<LoadEvent> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: Graph,
    layout: LayoutEngine,
    display_keys: Vec<String>,
    batch_rx: Option<Receiver<LoadEvent>>,
    batches_applied: usize,
    load_errors: Vec<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    graph_revision: u64,
    selected: Option<Element>,
    dragging: Option<NodeId>,
    pan: Vec2,
    zoom: f32,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<NodeId>>,
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let state = Self::start_load(&settings);
        Self { settings, state }
    }

    /// Streams every batch on a worker thread; the UI thread does all merging.
    fn spawn_load(settings: &Settings) -> Receiver<LoadEvent> {
        let (tx, rx) = mpsc::channel();
        let jobs = settings
            .files
            .iter()
            .map(|file| (file.clone(), None))
            .chain(
                settings
                    .expansions
                    .iter()
                    .map(|expansion| (expansion.file.clone(), Some(expansion.node))),
            )
            .collect::<Vec<_>>();

        thread::spawn(move || {
            for (source, expands) in jobs {
                let event = match read_query_result(&source) {
                    Ok(result) => LoadEvent::Batch {
                        source,
                        result,
                        expands,
                    },
                    Err(error) => LoadEvent::Failed {
                        source,
                        error: format!("{error:#}"),
                    },
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        });

        rx
    }

    fn start_load(settings: &Settings) -> AppState {
        if settings.files.is_empty() && settings.expansions.is_empty() {
            return AppState::Ready(Box::new(ViewModel::new(settings, None)));
        }
        AppState::Loading {
            rx: Self::spawn_load(settings),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(LoadEvent::Failed { source, error }) => {
                        warn!(source = %source.display(), "failed to load first batch");
                        transition = Some(AppState::Error(error));
                    }
                    Ok(event) => {
                        let rx = std::mem::replace(rx, mpsc::channel().1);
                        let mut model = ViewModel::new(&self.settings, Some(rx));
                        model.apply_event(event);
                        transition = Some(AppState::Ready(Box::new(model)));
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading query results...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load query results");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.settings));
                    }
                });
            }
            AppState::Ready(model) => {
                model.poll_batches();
                let mut reset_requested = false;
                model.show(ctx, &mut reset_requested);
                if reset_requested {
                    info!(graph = %self.settings.graph_name, "resetting graph");
                    transition = Some(Self::start_load(&self.settings));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(settings: &Settings, batch_rx: Option<Receiver<LoadEvent>>) -> Self {
        Self {
            graph: Graph::new(settings.graph_name.clone(), settings.palette.clone()),
            layout: LayoutEngine::new(settings.layout.clone()),
            display_keys: settings.display_keys.clone(),
            batch_rx,
            batches_applied: 0,
            load_errors: Vec::new(),
            search: String::new(),
            search_match_cache: None,
            graph_revision: 0,
            selected: None,
            dragging: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Drains whatever the loader produced since the last frame.
    fn poll_batches(&mut self) {
        let Some(rx) = self.batch_rx.take() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => {
                    self.batch_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    fn apply_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Batch {
                source,
                result,
                expands,
            } => {
                let touched = self.graph.extend(&result, expands.is_some());
                if let Some(node) = expands {
                    self.graph.set_expanded(node, true);
                }
                self.batches_applied += 1;
                info!(
                    source = %source.display(),
                    touched = touched.len(),
                    nodes = self.graph.nodes().len(),
                    edges = self.graph.edges().len(),
                    "applied batch"
                );
                if !touched.is_empty() {
                    self.graph_changed();
                }
            }
            LoadEvent::Failed { source, error } => {
                warn!(source = %source.display(), %error, "skipping unreadable batch");
                self.load_errors.push(error);
            }
        }
    }

    fn is_streaming(&self) -> bool {
        self.batch_rx.is_some()
    }

    /// Hands a fresh snapshot to the layout after any model mutation.
    fn graph_changed(&mut self) {
        self.graph_revision += 1;
        self.layout.configure(self.graph.data());
        if let Some(selected) = self.selected
            && !self.element_exists(selected)
        {
            self.selected = None;
        }
        if let Some(dragging) = self.dragging
            && self.graph.node(dragging).is_none()
        {
            self.dragging = None;
        }
    }

    fn element_exists(&self, element: Element) -> bool {
        match element {
            Element::Node(id) => self.graph.node(id).is_some(),
            Element::Edge(id) => self.graph.edge(id).is_some(),
        }
    }

    fn delete_selected(&mut self) {
        let Some(selected) = self.selected.take() else {
            return;
        };
        let removed = match selected {
            Element::Node(id) => self.graph.delete_node(id),
            Element::Edge(id) => self.graph.delete_edge(id),
        };
        if !removed.is_empty() {
            info!(
                nodes = removed.nodes.len(),
                edges = removed.edges.len(),
                groups = removed.groups.len(),
                "deleted selection"
            );
            self.graph_changed();
        }
    }

    fn collapse_selected(&mut self) {
        let Some(Element::Node(id)) = self.selected else {
            return;
        };
        let removed = self.graph.collapse_neighbors(&[id]);
        if !removed.is_empty() {
            self.graph_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn settings() -> Settings {
        Settings {
            files: Vec::new(),
            expansions: Vec::new(),
            layout: LayoutConfig::default(),
            palette: Palette::default(),
            display_keys: Vec::new(),
            graph_name: "g".to_owned(),
        }
    }

    #[test]
    fn collapsing_selection_folds_neighbours_and_clears_expanded() {
        let mut model = ViewModel::new(&settings(), None);
        let root: QueryResult =
            serde_json::from_value(json!({"data": [{"n": {"id": 1, "labels": ["Root"]}}]}))
                .expect("valid batch");
        let neighbours: QueryResult = serde_json::from_value(json!({"data": [
            {"n": {"id": 2, "labels": ["Leaf"]},
             "r": {"id": 5, "sourceId": 1, "destinationId": 2, "relationshipType": "HAS"}}
        ]}))
        .expect("valid batch");
        model.apply_event(LoadEvent::Batch {
            source: PathBuf::from("root.json"),
            result: root,
            expands: None,
        });
        model.apply_event(LoadEvent::Batch {
            source: PathBuf::from("neighbours.json"),
            result: neighbours,
            expands: Some(NodeId(1)),
        });
        assert!(model.graph.node(NodeId(1)).is_some_and(|node| node.expanded()));

        model.selected = Some(Element::Node(NodeId(1)));
        model.collapse_selected();
        assert_eq!(model.graph.nodes().len(), 1);
        assert!(model.graph.edges().is_empty());
        assert!(!model.graph.node(NodeId(1)).is_some_and(|node| node.expanded()));
        assert!(model.layout.body(NodeId(2)).is_none());
    }

    #[test]
    fn parses_expansion_arguments() {
        let expansion: Expansion = "42=batches/neighbours.json".parse().expect("valid");
        assert_eq!(expansion.node, NodeId(42));
        assert_eq!(expansion.file, PathBuf::from("batches/neighbours.json"));
        assert!("42".parse::<Expansion>().is_err());
        assert!("x=file.json".parse::<Expansion>().is_err());
        assert!("7=".parse::<Expansion>().is_err());
    }
}
