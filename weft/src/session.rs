use crate::algorithms::navigation::{navigate, NavigationHit, Navigator, NavigatorEvent, NavigatorState, PendingMove};
use crate::algorithms::patch::{apply_operation, Operation, PathPrefix};
use crate::algorithms::selection::{select_in_map, RectangleSelection};
use crate::algorithms::spatial_hash::CanvasIndex;
use crate::config::CanvasConfig;
use crate::error::{Error, Result};
use crate::event::{parse_message, Inbound, WorkflowPatch};
use crate::geometry::connector::ConnectorGeometry;
use crate::geometry::ports::PortGeometry;
use crate::model::{ConnectorEndpoint, Direction, ObjectKind, Point, PortSide, PositionedObject};
use crate::rpc::{RpcCall, RpcClient, Transport};
use crate::sync::{PatchWait, SnapshotSync};
use crate::workflow;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Everything scoped to one open workflow. Constructed when the workflow is
/// opened and dropped (after `close`) when it is left, so no wait or request
/// id can leak into the next session.
pub struct WorkflowSession<T: Transport> {
    config: CanvasConfig,
    prefix: PathPrefix,
    sync: SnapshotSync,
    rpc: RpcClient<T>,
    state: Value,
    placeholders: IndexMap<String, PositionedObject>,
    // bumped on every local state change; keys the index cache
    version: u64,
    diverged: bool,
    navigator: Navigator,
    index: RefCell<Option<(u64, Rc<CanvasIndex>)>>,
}

impl<T: Transport> WorkflowSession<T> {
    pub fn open(config: CanvasConfig, transport: T) -> Self {
        let config = config.sanitized();
        tracing::debug!(prefix = %config.path_prefix, policy = ?config.teardown_policy, "workflow session opened");
        WorkflowSession {
            prefix: PathPrefix::new(&config.path_prefix),
            sync: SnapshotSync::new(config.teardown_policy),
            rpc: RpcClient::new(transport),
            state: Value::Object(Default::default()),
            placeholders: IndexMap::new(),
            version: 1,
            diverged: false,
            navigator: Navigator::new(),
            index: RefCell::new(None),
            config,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn workflow(&self) -> Option<&Value> {
        workflow::workflow_root(&self.state, &self.prefix)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    pub fn last_snapshot(&self) -> Option<u64> {
        self.sync.last_seen()
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Install a full workflow under the path prefix. Clears a previous
    /// divergence.
    pub fn load_workflow(&mut self, workflow: Value) -> Result<()> {
        apply_operation(&mut self.state, &Operation::Add { path: self.prefix.as_str().to_string(), value: workflow })?;
        self.diverged = false;
        self.touch();
        tracing::debug!(version = self.version, "workflow loaded");
        self.navigator.handle(NavigatorEvent::GraphReady);
        let index = self.canvas_index();
        self.navigator.advance(&index);
        Ok(())
    }

    /// Apply a pushed patch, then release waits for its snapshot id.
    ///
    /// The patch is applied to a copy of the state and swapped in only when
    /// every operation succeeded, so readers never see half a patch. A patch
    /// that fails marks the session diverged: later patches are refused and
    /// the waits for this snapshot are not released.
    pub fn apply_event(&mut self, patch: WorkflowPatch) -> Result<()> {
        if self.diverged {
            tracing::warn!(snapshot_id = ?patch.snapshot_id, "refusing patch, session diverged");
            return Err(Error::SessionDiverged);
        }
        let n = patch.ops.len();
        let mut next = self.state.clone();
        if let Err(e) = self.prefix.apply(&mut next, patch.ops) {
            tracing::warn!(snapshot_id = ?patch.snapshot_id, error = %e, "patch rejected, session diverged");
            self.diverged = true;
            return Err(e);
        }
        self.state = next;
        self.touch();
        tracing::debug!(ops = n, snapshot_id = ?patch.snapshot_id, "patch applied");
        if let Some(id) = patch.snapshot_id {
            self.sync.notify_patch(id);
        }
        Ok(())
    }

    /// Route one raw inbound message to the RPC client or the patch engine.
    pub fn handle_message(&mut self, raw: &str) -> Result<()> {
        match parse_message(raw)? {
            Inbound::Response(r) => self.rpc.handle_response(r),
            Inbound::Patch(p) => self.apply_event(p),
            Inbound::Ignored { .. } => Ok(()),
        }
    }

    pub fn call(&mut self, method: &str, params: Vec<Value>) -> RpcCall {
        self.rpc.call(method, params)
    }

    /// Reject one pending call after the transport failed underneath it,
    /// e.g. the socket closed before the response arrived.
    pub fn fail_request(&mut self, id: u64, message: impl Into<String>) -> bool {
        let failed = self.rpc.fail(id, Error::Transport { message: message.into() });
        if !failed {
            tracing::debug!(id, "no pending request to fail");
        }
        failed
    }

    pub fn wait_for_patch(&mut self, snapshot_id: u64) -> PatchWait {
        self.sync.wait_for_patch(snapshot_id)
    }

    pub fn add_placeholder(&mut self, id: impl Into<String>, x: f64, y: f64) {
        let id = id.into();
        let size = self.config.node_size;
        let o = PositionedObject::new(id.clone(), ObjectKind::Placeholder, x, y).with_size(size, size);
        self.placeholders.insert(id, o);
        self.touch();
    }

    pub fn remove_placeholder(&mut self, id: &str) -> bool {
        let removed = self.placeholders.shift_remove(id).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Positioned objects and their spatial hash, rebuilt lazily after any
    /// state change.
    pub fn canvas_index(&self) -> Rc<CanvasIndex> {
        if let Some((built, idx)) = self.index.borrow().as_ref() {
            if *built == self.version {
                return idx.clone();
            }
        }
        let mut objects = self.workflow().map(|wf| workflow::positioned_objects(wf, self.config.node_size)).unwrap_or_default();
        for (id, p) in &self.placeholders {
            objects.insert(id.clone(), p.clone());
        }
        let idx = Rc::new(CanvasIndex::build(objects, self.config.cell_size));
        *self.index.borrow_mut() = Some((self.version, idx.clone()));
        idx
    }

    pub fn navigate(&self, from: &str, direction: Direction) -> Result<Option<NavigationHit>> {
        let index = self.canvas_index();
        let reference = index.get(from).ok_or_else(|| Error::UnknownObject { id: from.to_string() })?;
        Ok(navigate(reference, direction, &index))
    }

    /// Keyboard move through the navigator; waits for the graph if none is
    /// loaded yet.
    pub fn request_move(&mut self, from: Option<String>, direction: Direction) -> NavigatorState {
        self.navigator.handle(NavigatorEvent::MoveRequested(PendingMove { direction, from }));
        let index = self.canvas_index();
        self.navigator.advance(&index).clone()
    }

    pub fn navigator_state(&self) -> &NavigatorState {
        self.navigator.state()
    }

    pub fn select_rectangle(&self, start: Point, end: Point) -> RectangleSelection {
        select_in_map(start, end, &self.canvas_index().objects)
    }

    /// Absolute anchor of a port. Out ports belong to connection sources.
    pub fn port_anchor(&self, node_id: &str, port_index: u32, side: PortSide) -> Option<Point> {
        let node = workflow::node_info(self.workflow()?, node_id)?;
        let count = match side {
            PortSide::In => node.in_ports,
            PortSide::Out => node.out_ports,
        };
        let [dx, dy] = PortGeometry::from_config(&self.config).shift_for(port_index, count, side, node.flow_port);
        Some(Point { x: node.position.x + dx, y: node.position.y + dy })
    }

    pub fn resolve_endpoint(&self, endpoint: &ConnectorEndpoint, side: PortSide) -> Result<Point> {
        if let Some(p) = endpoint.absolute_point {
            return Ok(p);
        }
        let node_id = endpoint.node_id.as_deref().unwrap_or_default();
        let port = endpoint.port_index.unwrap_or(0);
        self.port_anchor(node_id, port, side).ok_or_else(|| Error::UnknownObject { id: node_id.to_string() })
    }

    pub fn connector_between(&self, start: &ConnectorEndpoint, end: &ConnectorEndpoint, offset_start: bool, offset_end: bool) -> Result<String> {
        let a = self.resolve_endpoint(start, PortSide::Out)?;
        let b = self.resolve_endpoint(end, PortSide::In)?;
        Ok(ConnectorGeometry::from_config(&self.config).path(a.x, a.y, b.x, b.y, offset_start, offset_end))
    }

    pub fn connector_path_for(&self, connection_id: &str) -> Result<String> {
        let c = self
            .workflow()
            .and_then(|wf| workflow::connection(wf, connection_id))
            .ok_or_else(|| Error::UnknownObject { id: connection_id.to_string() })?;
        self.connector_between(
            &ConnectorEndpoint::port(c.source_node, c.source_port),
            &ConnectorEndpoint::port(c.dest_node, c.dest_port),
            false,
            false,
        )
    }

    /// Session teardown: abandon snapshot waits (per policy) and reject
    /// pending requests.
    pub fn close(&mut self) {
        tracing::debug!(pending_waits = self.sync.pending_count(), pending_calls = self.rpc.pending_count(), "workflow session closed");
        self.sync.clear_stalled_promises();
        self.rpc.abandon_all();
        self.navigator.handle(NavigatorEvent::Teardown);
        *self.index.borrow_mut() = None;
    }
}
