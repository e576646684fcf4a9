use serde::{Deserialize, Serialize};

/// What happens to snapshot waits still pending when a session is torn down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownPolicy {
    /// Pending waits never complete.
    #[default]
    Abandon,
    /// Pending waits complete with `Error::WaitAbandoned`.
    Reject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub node_size: f64,
    pub port_size: f64,
    pub cell_size: f64,
    pub stacked_connector_nudge: f64,
    pub path_prefix: String,
    pub teardown_policy: TeardownPolicy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            node_size: 32.0,
            port_size: 9.0,
            cell_size: 100.0,
            stacked_connector_nudge: 3.0,
            path_prefix: "/activeWorkflow".to_string(),
            teardown_policy: TeardownPolicy::Abandon,
        }
    }
}

impl CanvasConfig {
    /// Clamp values that would make the geometry meaningless.
    pub fn sanitized(mut self) -> Self {
        use crate::geometry::limits::{MAX_CELL_SIZE, MIN_CELL_SIZE};
        if !self.cell_size.is_finite() {
            self.cell_size = CanvasConfig::default().cell_size;
        }
        self.cell_size = self.cell_size.clamp(MIN_CELL_SIZE, MAX_CELL_SIZE);
        if !(self.node_size.is_finite() && self.node_size > 0.0) {
            self.node_size = CanvasConfig::default().node_size;
        }
        if !(self.port_size.is_finite() && self.port_size >= 0.0) {
            self.port_size = CanvasConfig::default().port_size;
        }
        if !self.stacked_connector_nudge.is_finite() {
            self.stacked_connector_nudge = CanvasConfig::default().stacked_connector_nudge;
        }
        self.path_prefix = crate::algorithms::patch::PathPrefix::new(&self.path_prefix).as_str().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: CanvasConfig =
            serde_json::from_str(r#"{"cellSize": 50, "teardownPolicy": "reject"}"#).unwrap();
        assert_eq!(cfg.cell_size, 50.0);
        assert_eq!(cfg.teardown_policy, TeardownPolicy::Reject);
        assert_eq!(cfg.node_size, 32.0);
        assert_eq!(cfg.path_prefix, "/activeWorkflow");
    }

    #[test]
    fn sanitized_clamps_cell_size() {
        let cfg = CanvasConfig { cell_size: 0.0, ..CanvasConfig::default() }.sanitized();
        assert!(cfg.cell_size > 0.0);
        let cfg = CanvasConfig { cell_size: f64::NAN, ..CanvasConfig::default() }.sanitized();
        assert_eq!(cfg.cell_size, 100.0);
    }

    #[test]
    fn sanitized_roots_the_path_prefix() {
        let cfg = CanvasConfig { path_prefix: "activeWorkflow/".into(), ..CanvasConfig::default() }.sanitized();
        assert_eq!(cfg.path_prefix, "/activeWorkflow");
    }
}
