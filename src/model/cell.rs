use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Open property map carried through from the database, in delivery order.
pub type Properties = Map<String, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    #[error("{kind} cell is missing `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("{kind} cell field `{field}` has an unexpected type")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("path member is not an object")]
    InvalidPathMember,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeCell {
    pub id: u64,
    pub labels: Vec<String>,
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCell {
    pub id: u64,
    pub source_id: u64,
    pub destination_id: u64,
    pub relationship_type: String,
    pub properties: Properties,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathCell {
    pub nodes: Vec<NodeCell>,
    pub edges: Vec<EdgeCell>,
}

/// A graph-shaped value found in a result row.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Node(NodeCell),
    Edge(EdgeCell),
    Path(PathCell),
}

impl Cell {
    /// Sorts a raw value into a node, edge or path.
    ///
    /// Scalars and objects without a known discriminator yield `Ok(None)`.
    /// Path members that fail to decode are dropped individually so one bad
    /// member does not discard the rest of the path.
    pub fn classify(value: &Value) -> Result<Option<Self>, CellError> {
        let Some(object) = value.as_object() else {
            return Ok(None);
        };

        if let (Some(nodes), Some(edges)) = (object.get("nodes"), object.get("edges")) {
            return decode_path(nodes, edges).map(|path| Some(Self::Path(path)));
        }

        if object.contains_key("relationshipType") {
            return decode_edge(object).map(|edge| Some(Self::Edge(edge)));
        }

        if object.contains_key("labels") {
            return decode_node(object).map(|node| Some(Self::Node(node)));
        }

        Ok(None)
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a Value, CellError> {
    match object.get(field) {
        Some(Value::Null) | None => Err(CellError::MissingField { kind, field }),
        Some(value) => Ok(value),
    }
}

fn required_id(
    object: &Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<u64, CellError> {
    required(object, kind, field)?
        .as_u64()
        .ok_or(CellError::InvalidField { kind, field })
}

fn properties(object: &Map<String, Value>, kind: &'static str) -> Result<Properties, CellError> {
    match object.get("properties") {
        None | Some(Value::Null) => Ok(Properties::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(CellError::InvalidField {
            kind,
            field: "properties",
        }),
    }
}

fn decode_node(object: &Map<String, Value>) -> Result<NodeCell, CellError> {
    const KIND: &str = "node";

    let id = required_id(object, KIND, "id")?;
    let labels = required(object, KIND, "labels")?
        .as_array()
        .ok_or(CellError::InvalidField {
            kind: KIND,
            field: "labels",
        })?
        .iter()
        .map(|label| {
            label.as_str().map(str::to_owned).ok_or(CellError::InvalidField {
                kind: KIND,
                field: "labels",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodeCell {
        id,
        labels,
        properties: properties(object, KIND)?,
    })
}

fn decode_edge(object: &Map<String, Value>) -> Result<EdgeCell, CellError> {
    const KIND: &str = "edge";

    let relationship_type = required(object, KIND, "relationshipType")?
        .as_str()
        .ok_or(CellError::InvalidField {
            kind: KIND,
            field: "relationshipType",
        })?
        .to_owned();

    Ok(EdgeCell {
        id: required_id(object, KIND, "id")?,
        source_id: required_id(object, KIND, "sourceId")?,
        destination_id: required_id(object, KIND, "destinationId")?,
        relationship_type,
        properties: properties(object, KIND)?,
    })
}

fn decode_path(nodes: &Value, edges: &Value) -> Result<PathCell, CellError> {
    const KIND: &str = "path";

    let nodes = nodes.as_array().ok_or(CellError::InvalidField {
        kind: KIND,
        field: "nodes",
    })?;
    let edges = edges.as_array().ok_or(CellError::InvalidField {
        kind: KIND,
        field: "edges",
    })?;

    let mut path = PathCell::default();
    for member in nodes {
        match member
            .as_object()
            .ok_or(CellError::InvalidPathMember)
            .and_then(decode_node)
        {
            Ok(node) => path.nodes.push(node),
            Err(error) => debug!(%error, "skipping path node"),
        }
    }
    for member in edges {
        match member
            .as_object()
            .ok_or(CellError::InvalidPathMember)
            .and_then(decode_edge)
        {
            Ok(edge) => path.edges.push(edge),
            Err(error) => debug!(%error, "skipping path edge"),
        }
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_node_edge_and_path() {
        let node = json!({"id": 1, "labels": ["Person"], "properties": {"name": "Ada"}});
        let Some(Cell::Node(node)) = Cell::classify(&node).expect("valid") else {
            panic!("expected node");
        };
        assert_eq!(node.labels, ["Person"]);
        assert_eq!(node.properties["name"], "Ada");

        let edge = json!({
            "id": 10, "sourceId": 1, "destinationId": 2,
            "relationshipType": "KNOWS", "properties": {}
        });
        assert!(matches!(Cell::classify(&edge), Ok(Some(Cell::Edge(_)))));

        let path = json!({
            "nodes": [{"id": 1, "labels": ["A"]}, {"id": 2, "labels": ["B"]}],
            "edges": [{"id": 5, "sourceId": 1, "destinationId": 2, "relationshipType": "R"}]
        });
        let Some(Cell::Path(path)) = Cell::classify(&path).expect("valid") else {
            panic!("expected path");
        };
        assert_eq!(path.nodes.len(), 2);
        assert_eq!(path.edges.len(), 1);
    }

    #[test]
    fn scalars_and_plain_objects_are_ignored() {
        assert_eq!(Cell::classify(&json!(42)), Ok(None));
        assert_eq!(Cell::classify(&json!("text")), Ok(None));
        assert_eq!(Cell::classify(&json!({"count": 3})), Ok(None));
    }

    #[test]
    fn malformed_cells_report_the_missing_field() {
        assert_eq!(
            Cell::classify(&json!({"labels": ["Person"]})),
            Err(CellError::MissingField {
                kind: "node",
                field: "id"
            })
        );
        assert_eq!(
            Cell::classify(&json!({"id": 3, "relationshipType": "R", "sourceId": 1})),
            Err(CellError::MissingField {
                kind: "edge",
                field: "destinationId"
            })
        );
        assert_eq!(
            Cell::classify(&json!({"id": 3, "labels": "Person"})),
            Err(CellError::InvalidField {
                kind: "node",
                field: "labels"
            })
        );
    }

    #[test]
    fn bad_path_members_are_dropped_individually() {
        let path = json!({
            "nodes": [{"id": 1, "labels": ["A"]}, {"labels": ["B"]}, 7],
            "edges": [{"id": 5, "sourceId": 1, "destinationId": 2}]
        });
        let Some(Cell::Path(path)) = Cell::classify(&path).expect("valid") else {
            panic!("expected path");
        };
        assert_eq!(path.nodes.len(), 1);
        assert!(path.edges.is_empty());
    }
}
