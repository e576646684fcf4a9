use crate::config::CanvasConfig;
use crate::geometry::tolerance::{finite_or, js_number};
use crate::model::Point;

/// Cubic bezier between two port anchors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorCurve {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl ConnectorCurve {
    /// SVG path data, numbers formatted as JavaScript would.
    pub fn to_path(&self) -> String {
        let mut buf = ryu_js::Buffer::new();
        let mut d = String::with_capacity(48);
        let mut push = |prefix: &str, p: Point, d: &mut String| {
            d.push_str(prefix);
            d.push_str(js_number(p.x, &mut buf));
            d.push(',');
            d.push_str(js_number(p.y, &mut buf));
        };
        push("M", self.start, &mut d);
        push(" C", self.c1, &mut d);
        push(" ", self.c2, &mut d);
        push(" ", self.end, &mut d);
        d
    }

    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (uu, tt) = (u * u, t * t);
        let (a, b, c, d) = (uu * u, 3.0 * uu * t, 3.0 * u * tt, tt * t);
        Point {
            x: a * self.start.x + b * self.c1.x + c * self.c2.x + d * self.end.x,
            y: a * self.start.y + b * self.c1.y + c * self.c2.y + d * self.end.y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorGeometry {
    pub port_size: f64,
    pub stacked_nudge: f64,
}

impl Default for ConnectorGeometry {
    fn default() -> Self {
        ConnectorGeometry { port_size: 9.0, stacked_nudge: 3.0 }
    }
}

impl ConnectorGeometry {
    pub fn from_config(cfg: &CanvasConfig) -> Self {
        ConnectorGeometry { port_size: cfg.port_size, stacked_nudge: cfg.stacked_connector_nudge }
    }

    /// Curve from an output port anchor (x1, y1) to an input port anchor
    /// (x2, y2). Ends are pulled in to the port edge; control points sit a
    /// quarter of the horizontal plus a quarter of the vertical span away.
    pub fn curve(&self, x1: f64, y1: f64, x2: f64, y2: f64, offset_start: bool, offset_end: bool) -> ConnectorCurve {
        let inset = self.port_size / 2.0 - 0.5;
        let mut x1 = finite_or(x1, 0.0) + inset;
        let mut x2 = finite_or(x2, 0.0) - inset;
        let (y1, y2) = (finite_or(y1, 0.0), finite_or(y2, 0.0));
        if offset_start {
            x1 += self.stacked_nudge;
        }
        if offset_end {
            x2 -= self.stacked_nudge;
        }
        let width = (x1 - x2).abs();
        let height = (y1 - y2).abs();
        let blend = width / 4.0 + height / 4.0;
        ConnectorCurve {
            start: Point { x: x1, y: y1 },
            c1: Point { x: x1 + blend, y: y1 },
            c2: Point { x: x2 - blend, y: y2 },
            end: Point { x: x2, y: y2 },
        }
    }

    pub fn path(&self, x1: f64, y1: f64, x2: f64, y2: f64, offset_start: bool, offset_end: bool) -> String {
        self.curve(x1, y1, x2, y2, offset_start, offset_end).to_path()
    }
}

pub fn connector_path(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    ConnectorGeometry::default().path(x1, y1, x2, y2, false, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_path() {
        assert_eq!(connector_path(38.5, 7.5, 7.5, 40.5), "M42.5,7.5 C60.5,7.5 -14.5,40.5 3.5,40.5");
    }

    #[test]
    fn stacked_offsets_nudge_ends() {
        let g = ConnectorGeometry::default();
        let c = g.curve(0.0, 0.0, 100.0, 0.0, true, true);
        assert_eq!(c.start.x, 7.0);
        assert_eq!(c.end.x, 93.0);
    }

    #[test]
    fn zero_length_connector_is_defined() {
        let c = ConnectorGeometry::default().curve(10.0, 10.0, 10.0, 10.0, false, false);
        assert_eq!(c.start, Point { x: 14.0, y: 10.0 });
        assert_eq!(c.end, Point { x: 6.0, y: 10.0 });
        assert_eq!(c.point_at(0.0), c.start);
        assert_eq!(c.point_at(1.0), c.end);
    }

    #[test]
    fn non_finite_input_collapses_to_origin() {
        let d = connector_path(f64::NAN, 0.0, 0.0, f64::INFINITY);
        assert!(d.starts_with("M4,0 "));
    }
}
