use crate::algorithms::patch::PathPrefix;
use crate::geometry::limits::{in_coord_bounds, in_size_bounds};
use crate::model::{Bounds, Connection, ObjectKind, Point, PositionedObject};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// The workflow subtree the prefix points at, if it has been loaded.
pub fn workflow_root<'a>(state: &'a Value, prefix: &PathPrefix) -> Option<&'a Value> {
    state.pointer(prefix.as_str())
}

fn read_point(v: &Value) -> Option<Point> {
    let x = v.get("x")?.as_f64()?;
    let y = v.get("y")?.as_f64()?;
    (in_coord_bounds(x) && in_coord_bounds(y)).then_some(Point { x, y })
}

fn read_bounds(v: &Value) -> Option<Bounds> {
    let p = read_point(v)?;
    let width = v.get("width").and_then(Value::as_f64).unwrap_or(0.0);
    let height = v.get("height").and_then(Value::as_f64).unwrap_or(0.0);
    (in_size_bounds(width) && in_size_bounds(height)).then_some(Bounds { x: p.x, y: p.y, width, height })
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub id: String,
    pub position: Point,
    pub in_ports: u32,
    pub out_ports: u32,
    /// Metanodes have no implicit flow-variable port.
    pub flow_port: bool,
}

fn port_count(node: &Value, key: &str) -> u32 {
    node.get(key).and_then(Value::as_array).map_or(0, |a| a.len() as u32)
}

pub fn node_info(workflow: &Value, node_id: &str) -> Option<NodeInfo> {
    let node = workflow.get("nodes")?.get(node_id)?;
    Some(NodeInfo {
        id: node_id.to_string(),
        position: read_point(node.get("position")?)?,
        in_ports: port_count(node, "inPorts"),
        out_ports: port_count(node, "outPorts"),
        flow_port: node.get("kind").and_then(Value::as_str) != Some("metanode"),
    })
}

/// Nodes then annotations, in document order. Entries without a usable
/// position are skipped.
pub fn positioned_objects(workflow: &Value, node_size: f64) -> IndexMap<String, PositionedObject> {
    let mut out = IndexMap::new();
    if let Some(nodes) = workflow.get("nodes").and_then(Value::as_object) {
        for (id, node) in nodes {
            match node.get("position").and_then(read_point) {
                Some(p) => {
                    let o = PositionedObject::new(id.as_str(), ObjectKind::Node, p.x, p.y).with_size(node_size, node_size);
                    out.insert(id.clone(), o);
                }
                None => tracing::trace!(node = %id, "node without usable position"),
            }
        }
    }
    if let Some(annotations) = workflow.get("workflowAnnotations").and_then(Value::as_array) {
        for a in annotations {
            let Some(id) = a.get("id").and_then(Value::as_str) else { continue };
            let Some(b) = a.get("bounds").and_then(read_bounds) else { continue };
            let o = PositionedObject::new(id, ObjectKind::Annotation, b.x, b.y).with_size(b.width, b.height);
            out.insert(id.to_string(), o);
        }
    }
    out
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionSer {
    source_node: String,
    source_port: u32,
    dest_node: String,
    dest_port: u32,
}

fn read_connection(id: &str, v: &Value) -> Option<Connection> {
    let c = ConnectionSer::deserialize(v).ok()?;
    Some(Connection {
        id: id.to_string(),
        source_node: c.source_node,
        source_port: c.source_port,
        dest_node: c.dest_node,
        dest_port: c.dest_port,
    })
}

pub fn connection(workflow: &Value, id: &str) -> Option<Connection> {
    read_connection(id, workflow.get("connections")?.get(id)?)
}

pub fn connections(workflow: &Value) -> Vec<Connection> {
    workflow
        .get("connections")
        .and_then(Value::as_object)
        .map(|m| m.iter().filter_map(|(id, v)| read_connection(id, v)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "nodes": {
                "root:1": {"position": {"x": 10, "y": 20}, "inPorts": [{}], "outPorts": [{}, {}]},
                "root:2": {"position": {"x": 200, "y": 20}, "kind": "metanode"},
                "root:3": {"position": {"x": "bad"}}
            },
            "workflowAnnotations": [
                {"id": "ann1", "bounds": {"x": 0, "y": 100, "width": 50, "height": 30}}
            ],
            "connections": {
                "root:2_0": {"sourceNode": "root:1", "sourcePort": 1, "destNode": "root:2", "destPort": 0}
            }
        })
    }

    #[test]
    fn extracts_nodes_and_annotations() {
        let objs = positioned_objects(&sample(), 32.0);
        let ids: Vec<&str> = objs.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["root:1", "root:2", "ann1"]);
        assert_eq!(objs["ann1"].kind, ObjectKind::Annotation);
        assert_eq!(objs["root:1"].width, Some(32.0));
    }

    #[test]
    fn reads_ports_and_connections() {
        let wf = sample();
        let n = node_info(&wf, "root:1").unwrap();
        assert_eq!((n.in_ports, n.out_ports, n.flow_port), (1, 2, true));
        assert!(!node_info(&wf, "root:2").unwrap().flow_port);
        let c = connection(&wf, "root:2_0").unwrap();
        assert_eq!((c.source_node.as_str(), c.dest_port), ("root:1", 0));
        assert_eq!(connections(&wf).len(), 1);
    }
}
