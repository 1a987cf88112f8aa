use eframe::egui::Pos2;

use crate::model::{EdgeId, NodeId};

mod interaction;
mod view;

pub(super) use view::search_nodes;

/// Node projected into the current viewport.
#[derive(Clone, Copy, Debug)]
pub(super) struct ScreenNode {
    pub(super) id: NodeId,
    pub(super) position: Pos2,
    pub(super) radius: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ScreenEdge {
    pub(super) id: EdgeId,
    pub(super) start: Pos2,
    pub(super) end: Pos2,
}
