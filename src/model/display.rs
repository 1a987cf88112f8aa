use serde_json::Value;

use super::graph::Node;

/// Caption for a node: the first non-blank string property whose key matches
/// one of `keys` (case-insensitive, in priority order), else the node name.
pub fn display_text<'a>(node: &'a Node, keys: &[String]) -> &'a str {
    keys.iter()
        .find_map(|wanted| {
            node.properties()
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
                .and_then(|(_, value)| match value {
                    Value::String(text) if !text.trim().is_empty() => Some(text.as_str()),
                    _ => None,
                })
        })
        .unwrap_or_else(|| node.name())
}

pub fn default_display_keys() -> Vec<String> {
    ["name", "title", "label"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::cell::{NodeCell, Properties};
    use crate::model::graph::{Graph, NodeId};
    use crate::model::palette::Palette;

    fn graph_with(properties: serde_json::Value) -> Graph {
        let mut graph = Graph::new("g", Palette::default());
        let properties: Properties = serde_json::from_value(properties).expect("object");
        graph.extend_node(
            &NodeCell {
                id: 7,
                labels: vec!["Person".to_owned()],
                properties,
            },
            false,
        );
        graph
    }

    #[test]
    fn picks_first_matching_key() {
        let graph = graph_with(json!({"Title": "Dr", "NAME": "Ada"}));
        let node = graph.node(NodeId(7)).expect("node");
        assert_eq!(display_text(node, &default_display_keys()), "Ada");
        assert_eq!(display_text(node, &["title".to_owned()]), "Dr");
    }

    #[test]
    fn falls_back_to_name_for_blank_or_non_string_values() {
        let graph = graph_with(json!({"name": "   ", "title": 42}));
        let node = graph.node(NodeId(7)).expect("node");
        assert_eq!(display_text(node, &default_display_keys()), "7");
    }
}
