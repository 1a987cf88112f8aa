use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use super::cell::{Cell, EdgeCell, NodeCell, Properties};
use super::group::{GroupKind, GroupSet};
use super::palette::Palette;
use super::result::QueryResult;

/// Database id of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Database id of an edge. Rendered with a `_` prefix so it never reads as a
/// node id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeId),
    Edge(EdgeId),
}

/// What a single cell merge did to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    Created,
    Promoted,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    name: String,
    labels: Vec<String>,
    // None while the node only exists as an edge endpoint.
    category: Option<String>,
    color: String,
    properties: Properties,
    visible: bool,
    collapsed: bool,
    expanded: bool,
}

impl Node {
    fn placeholder(id: NodeId, color: &str, collapsed: bool) -> Self {
        Self {
            id,
            name: id.to_string(),
            labels: Vec::new(),
            category: None,
            color: color.to_owned(),
            properties: Properties::new(),
            visible: true,
            collapsed,
            expanded: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Primary group name, or `""` for a placeholder.
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or_default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.category.is_none()
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    fn has_label(&self, name: &str) -> bool {
        self.category.as_deref() == Some(name) || self.labels.iter().any(|label| label == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    relationship: String,
    color: String,
    properties: Properties,
    visible: bool,
    collapsed: bool,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

/// Flat node/link view handed to the layout engine and the renderer.
#[derive(Clone, Copy, Debug)]
pub struct GraphData<'a> {
    pub nodes: &'a [Node],
    pub links: &'a [Edge],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removed {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub groups: Vec<(GroupKind, String)>,
}

impl Removed {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// De-duplicated view model of one database graph.
///
/// Owns its group counters, so switching graphs means building a new
/// instance rather than clearing this one.
#[derive(Clone, Debug)]
pub struct Graph {
    name: String,
    palette: Palette,
    nodes: Vec<Node>,
    node_positions: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_positions: HashMap<EdgeId, usize>,
    categories: GroupSet,
    relationships: GroupSet,
    columns: Vec<String>,
    metadata: Vec<String>,
}

impl Graph {
    pub fn new(name: impl Into<String>, palette: Palette) -> Self {
        Self {
            name: name.into(),
            palette,
            nodes: Vec::new(),
            node_positions: HashMap::new(),
            edges: Vec::new(),
            edge_positions: HashMap::new(),
            categories: GroupSet::default(),
            relationships: GroupSet::default(),
            columns: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn data(&self) -> GraphData<'_> {
        GraphData {
            nodes: &self.nodes,
            links: &self.edges,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_positions
            .get(&id)
            .map(|&position| &self.nodes[position])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_positions
            .get(&id)
            .map(|&position| &self.edges[position])
    }

    pub fn groups(&self, kind: GroupKind) -> &GroupSet {
        match kind {
            GroupKind::Category => &self.categories,
            GroupKind::Relationship => &self.relationships,
        }
    }

    fn groups_mut(&mut self, kind: GroupKind) -> &mut GroupSet {
        match kind {
            GroupKind::Category => &mut self.categories,
            GroupKind::Relationship => &mut self.relationships,
        }
    }

    pub fn categories(&self) -> &GroupSet {
        &self.categories
    }

    pub fn relationships(&self) -> &GroupSet {
        &self.relationships
    }

    pub fn group_color(&self, kind: GroupKind, name: &str) -> Option<&str> {
        self.groups(kind)
            .get(name)
            .map(|group| self.palette.color(group.index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Merges one node record.
    ///
    /// A new id becomes a resolved node, a placeholder is promoted in place,
    /// and an already resolved node is left untouched.
    pub fn extend_node(&mut self, cell: &NodeCell, collapsed: bool) -> (&Node, Merge) {
        let (position, merge) = self.merge_node(cell, collapsed);
        (&self.nodes[position], merge)
    }

    /// Merges one edge record, creating placeholder endpoints for ids that
    /// have not been seen yet.
    pub fn extend_edge(&mut self, cell: &EdgeCell, collapsed: bool) -> (&Edge, Merge) {
        let (position, merge) = self.merge_edge(cell, collapsed);
        (&self.edges[position], merge)
    }

    /// Merges every graph-shaped cell of a result batch and returns the
    /// elements that were created or promoted by this call.
    pub fn extend(&mut self, result: &QueryResult, collapsed: bool) -> Vec<Element> {
        if !result.data.is_empty() {
            self.columns = result.columns();
        }
        self.metadata = result.metadata.clone();

        let mut touched = Vec::new();
        let mut skipped = 0usize;
        for value in result.cells() {
            match Cell::classify(value) {
                Ok(Some(Cell::Node(node))) => self.absorb_node(&node, collapsed, &mut touched),
                Ok(Some(Cell::Edge(edge))) => self.absorb_edge(&edge, collapsed, &mut touched),
                Ok(Some(Cell::Path(path))) => {
                    for node in &path.nodes {
                        self.absorb_node(node, collapsed, &mut touched);
                    }
                    for edge in &path.edges {
                        self.absorb_edge(edge, collapsed, &mut touched);
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    skipped += 1;
                    debug!(%error, "skipping malformed cell");
                }
            }
        }

        let mut seen = HashSet::with_capacity(touched.len());
        touched.retain(|element| seen.insert(*element));

        debug!(
            graph = %self.name,
            touched = touched.len(),
            skipped,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "merged result batch"
        );
        touched
    }

    fn absorb_node(&mut self, cell: &NodeCell, collapsed: bool, touched: &mut Vec<Element>) {
        let (_, merge) = self.extend_node(cell, collapsed);
        if merge != Merge::Unchanged {
            touched.push(Element::Node(NodeId(cell.id)));
        }
    }

    fn absorb_edge(&mut self, cell: &EdgeCell, collapsed: bool, touched: &mut Vec<Element>) {
        let unseen = [cell.source_id, cell.destination_id]
            .map(NodeId)
            .into_iter()
            .filter(|endpoint| !self.node_positions.contains_key(endpoint))
            .collect::<Vec<_>>();
        let (_, merge) = self.extend_edge(cell, collapsed);
        if merge != Merge::Unchanged {
            touched.extend(unseen.into_iter().map(Element::Node));
            touched.push(Element::Edge(EdgeId(cell.id)));
        }
    }

    fn resolve_category(&mut self, labels: &[String]) -> (String, usize, bool) {
        let category = labels.first().cloned().unwrap_or_default();
        for label in labels.iter().skip(1) {
            self.categories.resolve(label);
        }
        let group = self.categories.resolve(&category);
        (category, group.index, group.show)
    }

    fn merge_node(&mut self, cell: &NodeCell, collapsed: bool) -> (usize, Merge) {
        let id = NodeId(cell.id);
        let existing = self.node_positions.get(&id).copied();
        if let Some(position) = existing
            && !self.nodes[position].is_placeholder()
        {
            return (position, Merge::Unchanged);
        }

        let (category, index, show) = self.resolve_category(&cell.labels);
        let color = self.palette.color(index).to_owned();

        match existing {
            None => {
                let position = self.nodes.len();
                self.nodes.push(Node {
                    id,
                    name: id.to_string(),
                    labels: cell.labels.clone(),
                    category: Some(category),
                    color,
                    properties: cell.properties.clone(),
                    visible: show,
                    collapsed,
                    expanded: false,
                });
                self.node_positions.insert(id, position);
                (position, Merge::Created)
            }
            Some(position) => {
                let node = &mut self.nodes[position];
                node.name = id.to_string();
                node.labels = cell.labels.clone();
                node.category = Some(category);
                node.color = color;
                node.collapsed = collapsed;
                for (key, value) in &cell.properties {
                    node.properties.insert(key.clone(), value.clone());
                }
                if node.visible != show {
                    node.visible = show;
                    self.refresh_edge_visibility();
                }
                (position, Merge::Promoted)
            }
        }
    }

    fn merge_edge(&mut self, cell: &EdgeCell, collapsed: bool) -> (usize, Merge) {
        let id = EdgeId(cell.id);
        if let Some(&position) = self.edge_positions.get(&id) {
            return (position, Merge::Unchanged);
        }

        let group = self.relationships.resolve(&cell.relationship_type);
        let color = self.palette.color(group.index).to_owned();
        let show = group.show;

        let source = NodeId(cell.source_id);
        let target = NodeId(cell.destination_id);
        for endpoint in [source, target] {
            if !self.node_positions.contains_key(&endpoint) {
                let placeholder = Node::placeholder(endpoint, self.palette.color(0), collapsed);
                self.node_positions.insert(endpoint, self.nodes.len());
                self.nodes.push(placeholder);
            }
        }

        let visible = show && self.node_visible(source) && self.node_visible(target);
        let position = self.edges.len();
        self.edges.push(Edge {
            id,
            source,
            target,
            relationship: cell.relationship_type.clone(),
            color,
            properties: cell.properties.clone(),
            visible,
            collapsed,
        });
        self.edge_positions.insert(id, position);
        (position, Merge::Created)
    }

    fn node_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::visible)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> bool {
        let Some(&position) = self.node_positions.get(&id) else {
            return false;
        };
        self.nodes[position].expanded = expanded;
        true
    }

    /// Flips a group's `show` flag and recomputes element visibility.
    pub fn set_group_visibility(&mut self, kind: GroupKind, name: &str, show: bool) -> bool {
        if !self.groups_mut(kind).set_show(name, show) {
            return false;
        }
        self.refresh_visibility();
        true
    }

    fn refresh_visibility(&mut self) {
        for node in &mut self.nodes {
            node.visible = match node.category.as_deref() {
                None => true,
                Some(category) => self.categories.is_shown(category),
            };
        }
        self.refresh_edge_visibility();
    }

    fn refresh_edge_visibility(&mut self) {
        let visible_nodes = self
            .nodes
            .iter()
            .filter(|node| node.visible)
            .map(|node| node.id)
            .collect::<HashSet<_>>();
        for edge in &mut self.edges {
            edge.visible = self.relationships.is_shown(&edge.relationship)
                && visible_nodes.contains(&edge.source)
                && visible_nodes.contains(&edge.target);
        }
    }

    /// Drops a group once nothing references it. Returns whether it was
    /// removed. Indices of other groups are left alone.
    pub fn update_categories(&mut self, name: &str, kind: GroupKind) -> bool {
        if self.groups(kind).get(name).is_none() {
            return false;
        }

        let referenced = match kind {
            GroupKind::Category => self.nodes.iter().any(|node| node.has_label(name)),
            GroupKind::Relationship => self.edges.iter().any(|edge| edge.relationship == name),
        };
        if referenced {
            return false;
        }

        self.groups_mut(kind).remove(name).is_some()
    }

    /// Removes a node, every edge touching it and any groups left empty.
    pub fn delete_node(&mut self, id: NodeId) -> Removed {
        self.delete_elements(&[Element::Node(id)])
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> Removed {
        self.delete_elements(&[Element::Edge(id)])
    }

    pub fn delete_elements(&mut self, elements: &[Element]) -> Removed {
        let mut nodes = HashSet::new();
        let mut edges = HashSet::new();
        for element in elements {
            match *element {
                Element::Node(id) if self.node_positions.contains_key(&id) => {
                    nodes.insert(id);
                }
                Element::Edge(id) if self.edge_positions.contains_key(&id) => {
                    edges.insert(id);
                }
                _ => {}
            }
        }
        if nodes.is_empty() && edges.is_empty() {
            return Removed::default();
        }
        self.remove_elements(&nodes, &edges)
    }

    /// Folds back neighbors fetched by an expansion: collapsed nodes reached
    /// by links leaving `ids`, and recursively those reached from removed
    /// nodes that were expanded themselves.
    pub fn collapse_neighbors(&mut self, ids: &[NodeId]) -> Removed {
        let roots = ids.iter().copied().collect::<HashSet<_>>();
        let mut doomed = HashSet::new();
        let mut frontier = roots.clone();

        while !frontier.is_empty() {
            let reached = self
                .edges
                .iter()
                .filter(|edge| frontier.contains(&edge.source))
                .map(|edge| edge.target)
                .filter(|target| !roots.contains(target) && !doomed.contains(target))
                .filter(|target| self.node(*target).is_some_and(Node::collapsed))
                .collect::<HashSet<_>>();

            frontier = reached
                .iter()
                .copied()
                .filter(|id| self.node(*id).is_some_and(Node::expanded))
                .collect();
            doomed.extend(reached);
        }

        for id in &roots {
            self.set_expanded(*id, false);
        }

        if doomed.is_empty() {
            return Removed::default();
        }
        self.remove_elements(&doomed, &HashSet::new())
    }

    fn remove_elements(&mut self, node_ids: &HashSet<NodeId>, edge_ids: &HashSet<EdgeId>) -> Removed {
        let mut removed = Removed::default();
        let mut relationships = Vec::new();
        let mut endpoints = HashSet::new();

        self.edges.retain(|edge| {
            let drop = edge_ids.contains(&edge.id)
                || node_ids.contains(&edge.source)
                || node_ids.contains(&edge.target);
            if drop {
                removed.edges.push(edge.id);
                relationships.push(edge.relationship.clone());
                endpoints.insert(edge.source);
                endpoints.insert(edge.target);
            }
            !drop
        });

        let still_linked = self
            .edges
            .iter()
            .flat_map(|edge| [edge.source, edge.target])
            .collect::<HashSet<_>>();

        let mut labels = Vec::new();
        self.nodes.retain(|node| {
            let orphan_placeholder = node.is_placeholder()
                && endpoints.contains(&node.id)
                && !still_linked.contains(&node.id);
            let drop = node_ids.contains(&node.id) || orphan_placeholder;
            if drop {
                removed.nodes.push(node.id);
                labels.extend(node.category.iter().cloned());
                labels.extend(node.labels.iter().cloned());
            }
            !drop
        });

        self.reindex();

        labels.sort();
        labels.dedup();
        for label in labels {
            if self.update_categories(&label, GroupKind::Category) {
                removed.groups.push((GroupKind::Category, label));
            }
        }
        relationships.sort();
        relationships.dedup();
        for relationship in relationships {
            if self.update_categories(&relationship, GroupKind::Relationship) {
                removed.groups.push((GroupKind::Relationship, relationship));
            }
        }

        debug!(
            graph = %self.name,
            nodes = removed.nodes.len(),
            edges = removed.edges.len(),
            groups = removed.groups.len(),
            "removed elements"
        );
        removed
    }

    fn reindex(&mut self) {
        self.node_positions.clear();
        for (position, node) in self.nodes.iter().enumerate() {
            self.node_positions.insert(node.id, position);
        }
        self.edge_positions.clear();
        for (position, edge) in self.edges.iter().enumerate() {
            self.edge_positions.insert(edge.id, position);
        }
    }

    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut neighbors = self
            .edges
            .iter()
            .filter(|edge| edge.touches(id))
            .map(|edge| if edge.source == id { edge.target } else { edge.source })
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn batch(rows: Value) -> QueryResult {
        serde_json::from_value(json!({ "data": rows, "metadata": [] })).expect("valid batch")
    }

    fn node_cell(id: u64, labels: &[&str]) -> NodeCell {
        NodeCell {
            id,
            labels: labels.iter().map(|label| (*label).to_owned()).collect(),
            properties: Properties::new(),
        }
    }

    fn edge_cell(id: u64, source: u64, target: u64, relationship: &str) -> EdgeCell {
        EdgeCell {
            id,
            source_id: source,
            destination_id: target,
            relationship_type: relationship.to_owned(),
            properties: Properties::new(),
        }
    }

    fn knows_batch() -> QueryResult {
        batch(json!([{
            "a": {"id": 1, "labels": ["Person"], "properties": {"name": "Ada"}},
            "r": {"id": 10, "sourceId": 1, "destinationId": 2, "relationshipType": "KNOWS", "properties": {}},
            "b": {"id": 2, "labels": ["Person"], "properties": {"name": "Bob"}}
        }]))
    }

    #[test]
    fn person_knows_person_scenario() {
        let mut graph = Graph::new("social", Palette::default());
        let touched = graph.extend(&knows_batch(), false);

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.nodes().iter().all(|node| node.category() == "Person"));
        assert_eq!(graph.nodes()[0].color(), graph.nodes()[1].color());
        assert_eq!(graph.edges()[0].relationship(), "KNOWS");
        assert_eq!(graph.edges()[0].id().to_string(), "_10");
        assert_eq!(graph.categories().len(), 1);
        assert_eq!(graph.categories().get("Person").map(|g| g.index), Some(0));
        assert_eq!(graph.relationships().len(), 1);
        assert_eq!(graph.relationships().get("KNOWS").map(|g| g.index), Some(0));
        assert_eq!(
            touched,
            [
                Element::Node(NodeId(1)),
                Element::Node(NodeId(2)),
                Element::Edge(EdgeId(10))
            ]
        );
        assert_eq!(graph.columns(), ["a", "r", "b"]);
    }

    #[test]
    fn extending_twice_is_idempotent() {
        let mut graph = Graph::new("social", Palette::default());
        graph.extend(&knows_batch(), false);
        let nodes = graph.nodes().to_vec();
        let edges = graph.edges().to_vec();

        let touched = graph.extend(&knows_batch(), false);
        assert!(touched.is_empty());
        assert_eq!(graph.nodes(), nodes.as_slice());
        assert_eq!(graph.edges(), edges.as_slice());
        assert_eq!(graph.categories().len(), 1);
        assert_eq!(graph.relationships().len(), 1);
    }

    #[test]
    fn placeholder_is_promoted_in_place() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Person"]), false);
        graph.extend_edge(&edge_cell(7, 1, 5, "KNOWS"), false);

        let placeholder = graph.node(NodeId(5)).expect("placeholder exists");
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.category(), "");
        assert_eq!(graph.nodes()[1].id(), NodeId(5));
        assert!(graph.categories().get("").is_none());

        let mut cell = node_cell(5, &["City"]);
        cell.properties.insert("name".to_owned(), json!("Oslo"));
        let (node, merge) = graph.extend_node(&cell, false);
        assert_eq!(merge, Merge::Promoted);
        assert_eq!(node.category(), "City");
        assert_eq!(node.properties()["name"], "Oslo");

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.nodes()[1].id(), NodeId(5));
        assert!(!graph.nodes()[1].is_placeholder());
        assert_eq!(graph.node(NodeId(5)).map(Node::color), Some(Palette::default().color(1)));
    }

    #[test]
    fn resolved_node_is_not_overwritten() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Person"]), false);
        let (node, merge) = graph.extend_node(&node_cell(1, &["Robot"]), false);
        assert_eq!(merge, Merge::Unchanged);
        assert_eq!(node.category(), "Person");
        assert!(graph.categories().get("Robot").is_none());
    }

    #[test]
    fn every_edge_endpoint_resolves() {
        let mut graph = Graph::new("g", Palette::default());
        let touched = graph.extend(
            &batch(json!([
                {"r": {"id": 1, "sourceId": 3, "destinationId": 4, "relationshipType": "R"}},
                {"r": {"id": 2, "sourceId": 4, "destinationId": 4, "relationshipType": "R"}}
            ])),
            false,
        );
        assert_eq!(graph.nodes().len(), 2);
        for edge in graph.edges() {
            assert!(graph.node(edge.source()).is_some());
            assert!(graph.node(edge.target()).is_some());
        }
        assert_eq!(touched.len(), 4);
    }

    #[test]
    fn malformed_cells_are_skipped() {
        let mut graph = Graph::new("g", Palette::default());
        let touched = graph.extend(
            &batch(json!([
                {"n": {"labels": ["Person"]}, "m": {"id": 2, "labels": ["Person"]}},
                {"r": {"id": 9, "relationshipType": "R", "sourceId": 2}, "count": 12}
            ])),
            false,
        );
        assert_eq!(touched, [Element::Node(NodeId(2))]);
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
        assert!(graph.relationships().is_empty());
    }

    #[test]
    fn path_cells_merge_members() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend(
            &batch(json!([{
                "p": {
                    "nodes": [{"id": 1, "labels": ["A"]}, {"id": 2, "labels": ["B"]}, {"id": 3, "labels": ["A"]}],
                    "edges": [
                        {"id": 1, "sourceId": 1, "destinationId": 2, "relationshipType": "X"},
                        {"id": 2, "sourceId": 2, "destinationId": 3, "relationshipType": "Y"}
                    ]
                }
            }])),
            false,
        );
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.nodes().iter().all(|node| !node.is_placeholder()));
        assert_eq!(graph.relationships().get("Y").map(|g| g.index), Some(1));
    }

    #[test]
    fn colors_repeat_after_palette_is_exhausted() {
        let palette = Palette::default();
        let k = palette.len();
        let mut graph = Graph::new("g", palette);
        for id in 0..=k as u64 {
            graph.extend_node(&node_cell(id, &[&format!("L{id}")]), false);
        }
        let first = graph.node(NodeId(0)).map(Node::color);
        let wrapped = graph.node(NodeId(k as u64)).map(Node::color);
        assert_eq!(first, wrapped);
        assert_ne!(first, graph.node(NodeId(1)).map(Node::color));
    }

    #[test]
    fn category_retracts_and_returns_with_new_index() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Person"]), false);
        graph.extend_node(&node_cell(2, &["Person"]), false);
        graph.extend_node(&node_cell(3, &["City"]), false);

        graph.delete_node(NodeId(1));
        assert!(graph.categories().get("Person").is_some());
        let removed = graph.delete_node(NodeId(2));
        assert_eq!(removed.groups, [(GroupKind::Category, "Person".to_owned())]);
        assert!(graph.categories().get("Person").is_none());
        assert_eq!(graph.categories().get("City").map(|g| g.index), Some(1));

        graph.extend_node(&node_cell(4, &["Person"]), false);
        assert_eq!(graph.categories().get("Person").map(|g| g.index), Some(2));
    }

    #[test]
    fn deleting_an_endpoint_removes_its_edges_and_groups() {
        let mut graph = Graph::new("social", Palette::default());
        graph.extend(&knows_batch(), false);

        let removed = graph.delete_node(NodeId(2));
        assert_eq!(removed.nodes, [NodeId(2)]);
        assert_eq!(removed.edges, [EdgeId(10)]);
        assert!(graph.edges().is_empty());
        assert!(graph.relationships().get("KNOWS").is_none());
        assert!(graph.categories().get("Person").is_some());
        assert_eq!(graph.node(NodeId(1)).map(Node::category), Some("Person"));
    }

    #[test]
    fn deleting_an_edge_drops_orphan_placeholders() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Person"]), false);
        graph.extend_edge(&edge_cell(3, 1, 9, "OWNS"), false);

        let removed = graph.delete_edge(EdgeId(3));
        assert_eq!(removed.nodes, [NodeId(9)]);
        assert!(graph.node(NodeId(1)).is_some());
        assert!(graph.node(NodeId(9)).is_none());
        assert!(graph.relationships().is_empty());
    }

    #[test]
    fn update_categories_keeps_referenced_groups() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Person", "Employee"]), false);
        assert!(!graph.update_categories("Employee", GroupKind::Category));
        assert!(!graph.update_categories("Missing", GroupKind::Category));
        graph.delete_node(NodeId(1));
        assert!(graph.categories().is_empty());
    }

    #[test]
    fn visibility_follows_group_toggles() {
        let mut graph = Graph::new("social", Palette::default());
        graph.extend(&knows_batch(), false);

        assert!(graph.set_group_visibility(GroupKind::Relationship, "KNOWS", false));
        assert!(!graph.edges()[0].visible());
        assert!(graph.nodes().iter().all(Node::visible));

        graph.set_group_visibility(GroupKind::Relationship, "KNOWS", true);
        graph.set_group_visibility(GroupKind::Category, "Person", false);
        assert!(graph.nodes().iter().all(|node| !node.visible()));
        assert!(!graph.edges()[0].visible());
        assert!(!graph.set_group_visibility(GroupKind::Category, "Nope", false));
    }

    #[test]
    fn collapse_removes_expanded_neighbors() {
        let mut graph = Graph::new("g", Palette::default());
        graph.extend_node(&node_cell(1, &["Root"]), false);
        graph.set_expanded(NodeId(1), true);
        graph.extend(
            &batch(json!([
                {"n": {"id": 2, "labels": ["Leaf"]}, "r": {"id": 1, "sourceId": 1, "destinationId": 2, "relationshipType": "HAS"}},
                {"n": {"id": 3, "labels": ["Leaf"]}, "r": {"id": 2, "sourceId": 1, "destinationId": 3, "relationshipType": "HAS"}}
            ])),
            true,
        );
        graph.set_expanded(NodeId(2), true);
        graph.extend(
            &batch(json!([
                {"n": {"id": 4, "labels": ["Leaf"]}, "r": {"id": 3, "sourceId": 2, "destinationId": 4, "relationshipType": "HAS"}}
            ])),
            true,
        );

        let removed = graph.collapse_neighbors(&[NodeId(1)]);
        let mut nodes = removed.nodes.clone();
        nodes.sort();
        assert_eq!(nodes, [NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
        assert!(!graph.node(NodeId(1)).is_some_and(Node::expanded));
        assert!(graph.categories().get("Leaf").is_none());
    }

    #[test]
    fn new_instance_restarts_counters() {
        let mut first = Graph::new("a", Palette::default());
        first.extend_node(&node_cell(1, &["A"]), false);
        first.extend_node(&node_cell(2, &["B"]), false);

        let mut second = Graph::new("b", Palette::default());
        second.extend_node(&node_cell(1, &["B"]), false);
        assert_eq!(second.categories().get("B").map(|g| g.index), Some(0));
    }
}
