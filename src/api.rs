use crate::error;
use crate::interop::{from_js, new_obj, set_kv, to_js};
use crate::WorkflowCanvas;
use js_sys::Promise;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use weft::{CanvasConfig, ConnectorEndpoint, Direction, NavigatorState, Point, PortSide};

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn port_shift(port_index: u32, port_count: u32) -> Vec<f64> {
    weft::port_shift(port_index, port_count).to_vec()
}

#[wasm_bindgen]
pub fn connector_path(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
    weft::connector_path(x1, y1, x2, y2)
}

fn parse_direction(s: &str) -> Result<Direction, JsValue> {
    Direction::parse(s).ok_or_else(|| error::invalid_direction(s))
}

fn check_finite(params: &[(&str, f64)]) -> Result<(), JsValue> {
    match params.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(error::non_finite(name)),
        None => Ok(()),
    }
}

fn parse_u64_id(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= 9_007_199_254_740_991.0).then_some(v as u64)
}

fn envelope(r: Result<JsValue, JsValue>) -> JsValue {
    match r {
        Ok(v) => error::ok(v),
        Err(e) => error::err("serialize_error", crate::interop::js_error_message(&e), None),
    }
}

// Protocol violations mean local state can no longer be trusted; make them
// visible even when nobody inspects the result.
fn report(e: &weft::Error) {
    if e.is_protocol_violation() || matches!(e, weft::Error::SessionDiverged) {
        web_sys::console::error_1(&JsValue::from_str(&format!("weft: {e}")));
    } else {
        tracing::debug!(code = e.code(), error = %e, "request failed");
    }
}

#[wasm_bindgen]
impl WorkflowCanvas {
    /// `config` may be undefined for defaults. `send` receives each
    /// serialized JSON-RPC request.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, send: js_sys::Function) -> Result<WorkflowCanvas, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            CanvasConfig::default()
        } else {
            from_js::<CanvasConfig>(config)
                .map_err(|e| error::error_object("invalid_config", e.to_string(), None))?
        };
        Ok(WorkflowCanvas::rs_new(config, send))
    }
    pub fn version(&self) -> u64 {
        self.rs_version()
    }
    pub fn is_diverged(&self) -> bool {
        self.inner.is_diverged()
    }
    pub fn last_snapshot(&self) -> Option<f64> {
        self.inner.last_snapshot().map(|id| id as f64)
    }

    // Workflow state
    pub fn load_workflow(&mut self, workflow: JsValue) -> bool {
        is_ok(&self.load_workflow_res(workflow))
    }
    pub fn load_workflow_res(&mut self, workflow: JsValue) -> JsValue {
        let value = match from_js::<Value>(workflow) {
            Ok(v) => v,
            Err(e) => return error::err("json_parse", e.to_string(), None),
        };
        match self.inner.load_workflow(value) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::from_weft(&e),
        }
    }
    pub fn get_state(&self) -> JsValue {
        self.inner.workflow().and_then(|wf| to_js(wf).ok()).unwrap_or(JsValue::NULL)
    }
    pub fn get_state_res(&self) -> JsValue {
        match self.inner.workflow() {
            Some(wf) => envelope(to_js(wf)),
            None => error::ok(JsValue::NULL),
        }
    }

    // Channels
    pub fn handle_message(&mut self, raw: &str) -> bool {
        is_ok(&self.handle_message_res(raw))
    }
    /// Feed one raw message from the socket: a JSON-RPC response or a
    /// pushed event.
    pub fn handle_message_res(&mut self, raw: &str) -> JsValue {
        match self.inner.handle_message(raw) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => {
                report(&e);
                error::from_weft(&e)
            }
        }
    }
    /// Resolves with the call's result, rejects with `{code, message, data}`.
    pub fn call(&mut self, method: &str, params: JsValue) -> Promise {
        let params = if params.is_undefined() || params.is_null() {
            Vec::new()
        } else {
            match from_js::<Vec<Value>>(params) {
                Ok(p) => p,
                Err(e) => return Promise::reject(&error::error_object("invalid_argument", e.to_string(), None)),
            }
        };
        let call = self.inner.call(method, params);
        future_to_promise(async move {
            match call.await {
                Ok(v) => to_js(&v),
                Err(e) => {
                    report(&e);
                    Err(error::rejection(&e))
                }
            }
        })
    }
    /// Reject the pending call with request `id` (read from the message
    /// handed to `send`) after the socket failed underneath it.
    pub fn fail_request(&mut self, id: f64, message: &str) -> bool {
        match parse_u64_id(id) {
            Some(id) => self.inner.fail_request(id, message),
            None => false,
        }
    }
    /// Resolves once the patch carrying `snapshot_id` has been applied.
    pub fn wait_for_patch(&mut self, snapshot_id: f64) -> Promise {
        let Some(id) = parse_u64_id(snapshot_id) else {
            return Promise::reject(&error::error_object("invalid_argument", "snapshot id must be a non-negative integer", None));
        };
        let wait = self.inner.wait_for_patch(id);
        future_to_promise(async move {
            match wait.await {
                Ok(()) => Ok(JsValue::UNDEFINED),
                Err(e) => Err(error::rejection(&e)),
            }
        })
    }
    /// Leave the workflow. Pending calls reject; pending waits follow the
    /// configured teardown policy.
    pub fn close(&mut self) {
        self.inner.close();
    }

    // Placeholders
    pub fn add_placeholder(&mut self, id: &str, x: f64, y: f64) -> bool {
        is_ok(&self.add_placeholder_res(id, x, y))
    }
    pub fn add_placeholder_res(&mut self, id: &str, x: f64, y: f64) -> JsValue {
        if let Err(e) = check_finite(&[("x", x), ("y", y)]) {
            return e;
        }
        if id.is_empty() {
            return error::invalid_argument("id", "placeholder id must not be empty");
        }
        self.inner.add_placeholder(id, x, y);
        error::ok(JsValue::TRUE)
    }
    pub fn remove_placeholder(&mut self, id: &str) -> bool {
        self.inner.remove_placeholder(id)
    }

    // Navigation + selection
    pub fn navigate(&self, from: &str, direction: &str) -> JsValue {
        match Direction::parse(direction).map(|d| self.inner.navigate(from, d)) {
            Some(Ok(Some(hit))) => to_js(&hit).unwrap_or(JsValue::NULL),
            _ => JsValue::NULL,
        }
    }
    pub fn navigate_res(&self, from: &str, direction: &str) -> JsValue {
        let direction = match parse_direction(direction) {
            Ok(d) => d,
            Err(e) => return e,
        };
        match self.inner.navigate(from, direction) {
            Ok(Some(hit)) => envelope(to_js(&hit)),
            Ok(None) => error::ok(JsValue::NULL),
            Err(e) => error::from_weft(&e),
        }
    }
    /// Keyboard move. Before a workflow is loaded the move is parked and
    /// resolved by the next `load_workflow`; poll `navigator_state`.
    pub fn request_move_res(&mut self, from: Option<String>, direction: &str) -> JsValue {
        let direction = match parse_direction(direction) {
            Ok(d) => d,
            Err(e) => return e,
        };
        let state = self.inner.request_move(from, direction);
        error::ok(navigator_state_obj(&state))
    }
    pub fn navigator_state(&self) -> JsValue {
        navigator_state_obj(self.inner.navigator_state())
    }
    pub fn select_rectangle(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> JsValue {
        let sel = self.inner.select_rectangle(Point { x: x1, y: y1 }, Point { x: x2, y: y2 });
        to_js(&sel).unwrap_or(JsValue::NULL)
    }
    pub fn select_rectangle_res(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> JsValue {
        if let Err(e) = check_finite(&[("x1", x1), ("y1", y1), ("x2", x2), ("y2", y2)]) {
            return e;
        }
        envelope(to_js(&self.inner.select_rectangle(Point { x: x1, y: y1 }, Point { x: x2, y: y2 })))
    }

    // Connectors
    pub fn port_anchor_res(&self, node_id: &str, port_index: u32, out: bool) -> JsValue {
        let side = if out { PortSide::Out } else { PortSide::In };
        match self.inner.port_anchor(node_id, port_index, side) {
            Some(p) => envelope(to_js(&p)),
            None => error::from_weft(&weft::Error::UnknownObject { id: node_id.to_string() }),
        }
    }
    pub fn connector_path_for(&self, connection_id: &str) -> Option<String> {
        self.inner.connector_path_for(connection_id).ok()
    }
    pub fn connector_path_for_res(&self, connection_id: &str) -> JsValue {
        match self.inner.connector_path_for(connection_id) {
            Ok(d) => error::ok(JsValue::from_str(&d)),
            Err(e) => error::from_weft(&e),
        }
    }
    /// `start`/`end` are `{nodeId, portIndex}` or `{absolutePoint: {x, y}}`
    /// for an end still being dragged.
    pub fn connector_between_res(&self, start: JsValue, end: JsValue, offset_start: bool, offset_end: bool) -> JsValue {
        let start = match from_js::<ConnectorEndpoint>(start) {
            Ok(v) => v,
            Err(e) => return error::invalid_argument("start", e.to_string()),
        };
        let end = match from_js::<ConnectorEndpoint>(end) {
            Ok(v) => v,
            Err(e) => return error::invalid_argument("end", e.to_string()),
        };
        match self.inner.connector_between(&start, &end, offset_start, offset_end) {
            Ok(d) => error::ok(JsValue::from_str(&d)),
            Err(e) => error::from_weft(&e),
        }
    }
}

fn is_ok(v: &JsValue) -> bool {
    js_sys::Reflect::get(v, &JsValue::from_str("ok"))
        .ok()
        .and_then(|x| x.as_bool())
        .unwrap_or(false)
}

fn navigator_state_obj(state: &NavigatorState) -> JsValue {
    let o = new_obj();
    let (name, target) = match state {
        NavigatorState::Idle => ("idle", None),
        NavigatorState::AwaitingGraph(_) => ("awaitingGraph", None),
        NavigatorState::Searching(_) => ("searching", None),
        NavigatorState::Done(hit) => ("done", hit.as_ref()),
    };
    set_kv(&o, "state", &JsValue::from_str(name));
    let target = target.and_then(|h| to_js(h).ok()).unwrap_or(JsValue::NULL);
    set_kv(&o, "target", &target);
    o.into()
}
