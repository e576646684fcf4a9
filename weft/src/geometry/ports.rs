use crate::config::CanvasConfig;
use crate::model::PortSide;

/// Port placement on a square node.
///
/// Ports are laid out along the node's vertical edge. Index 0 is normally
/// the implicit flow-variable port, drawn above the node's top edge; the
/// remaining data ports split the node height into equal slots. With exactly
/// two data ports the middle slot stays free, so they land at 1/4 and 3/4.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortGeometry {
    pub node_size: f64,
    pub port_size: f64,
}

impl Default for PortGeometry {
    fn default() -> Self {
        PortGeometry { node_size: 32.0, port_size: 9.0 }
    }
}

impl PortGeometry {
    pub fn from_config(cfg: &CanvasConfig) -> Self {
        PortGeometry { node_size: cfg.node_size, port_size: cfg.port_size }
    }

    /// Offset of an input port with the flow-variable convention.
    pub fn shift(&self, port_index: u32, port_count: u32) -> [f64; 2] {
        self.shift_for(port_index, port_count, PortSide::In, true)
    }

    pub fn shift_for(&self, port_index: u32, port_count: u32, side: PortSide, flow_port: bool) -> [f64; 2] {
        let [dx, dy] = if flow_port && port_index == 0 {
            [self.port_size / 2.0, -self.port_size / 2.0]
        } else {
            let data_count = if flow_port { port_count.saturating_sub(1) } else { port_count };
            let slot = if flow_port { port_index } else { port_index.saturating_add(1) };
            let (slot, divisions) = if data_count == 2 {
                (if slot == 2 { 3 } else { slot }, 4)
            } else {
                (slot, data_count.saturating_add(1))
            };
            [self.port_size, self.node_size * f64::from(slot) / f64::from(divisions)]
        };
        match side {
            PortSide::In => [dx, dy],
            PortSide::Out => [self.node_size - dx, dy],
        }
    }
}

/// `PortGeometry::default().shift(..)`.
pub fn port_shift(port_index: u32, port_count: u32) -> [f64; 2] {
    PortGeometry::default().shift(port_index, port_count)
}
