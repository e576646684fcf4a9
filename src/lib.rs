use wasm_bindgen::prelude::*;
mod api;
pub mod error;
mod interop;

pub use api::{connector_path, port_shift, set_panic_hook};

/// Sends serialized JSON-RPC requests through a host callback.
pub struct JsTransport {
    send: js_sys::Function,
}

impl JsTransport {
    pub fn new(send: js_sys::Function) -> Self {
        JsTransport { send }
    }
}

impl weft::Transport for JsTransport {
    fn send(&mut self, message: String) -> weft::Result<()> {
        match self.send.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
            Ok(_) => Ok(()),
            Err(e) => {
                let message = interop::js_error_message(&e);
                web_sys::console::warn_2(&JsValue::from_str("weft: transport send failed"), &e);
                Err(weft::Error::Transport { message })
            }
        }
    }
}

#[wasm_bindgen]
pub struct WorkflowCanvas { pub(crate) inner: weft::WorkflowSession<JsTransport> }

impl WorkflowCanvas {
    pub fn rs_new(config: weft::CanvasConfig, send: js_sys::Function) -> WorkflowCanvas {
        WorkflowCanvas { inner: weft::WorkflowSession::open(config, JsTransport::new(send)) }
    }
    pub fn rs_version(&self) -> u64 { self.inner.version() }
}
