use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Node,
    Annotation,
    Placeholder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.x + other.width
            && self.x + self.width >= other.x
            && self.y <= other.y + other.height
            && self.y + self.height >= other.y
    }

    pub fn expanded(&self, margin: f64) -> Bounds {
        Bounds {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }
}

/// A graphical object on the canvas. Width/height are optional on the wire;
/// a missing size is treated as a point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionedObject {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub kind: ObjectKind,
}

impl PositionedObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind, x: f64, y: f64) -> Self {
        PositionedObject { id: id.into(), x, y, width: None, height: None, kind }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            width: self.width.unwrap_or(0.0),
            height: self.height.unwrap_or(0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "top" | "up" => Some(Direction::Top),
            "bottom" | "down" => Some(Direction::Bottom),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Which side of a node a port sits on. Input ports are on the left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    In,
    Out,
}

/// One end of a connector. While dragging, an end is unterminated and only
/// carries `absolute_point`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorEndpoint {
    pub node_id: Option<String>,
    pub port_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_point: Option<Point>,
}

impl ConnectorEndpoint {
    pub fn port(node_id: impl Into<String>, port_index: u32) -> Self {
        ConnectorEndpoint { node_id: Some(node_id.into()), port_index: Some(port_index), absolute_point: None }
    }

    pub fn floating(x: f64, y: f64) -> Self {
        ConnectorEndpoint { node_id: None, port_index: None, absolute_point: Some(Point { x, y }) }
    }
}

/// A directed connection between an output port and an input port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_node: String,
    pub source_port: u32,
    pub dest_node: String,
    pub dest_port: u32,
}
