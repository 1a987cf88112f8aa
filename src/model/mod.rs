mod cell;
mod display;
mod graph;
mod group;
mod palette;
mod result;

pub use cell::Properties;
pub use display::{default_display_keys, display_text};
pub use graph::{Edge, EdgeId, Element, Graph, GraphData, Node, NodeId};
pub use group::GroupKind;
pub use palette::Palette;
pub use result::{QueryResult, read_query_result};
