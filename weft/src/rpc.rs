use crate::error::{Error, Result};
use futures::channel::oneshot;
use futures::future::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outbound half of the command channel. Delivery is assumed reliable and
/// ordered; responses come back through [`RpcClient::handle_response`].
pub trait Transport {
    fn send(&mut self, message: String) -> Result<()>;
}

impl<F> Transport for F
where
    F: FnMut(String) -> Result<()>,
{
    fn send(&mut self, message: String) -> Result<()> {
        self(message)
    }
}

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

// `"result": null` is a valid void result, distinct from a missing field
fn present<'de, D>(d: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(d).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Request/response correlation over a one-shot call channel. Ids are
/// per-client and start at 1.
pub struct RpcClient<T: Transport> {
    transport: T,
    next_id: u64,
    pending: HashMap<u64, oneshot::Sender<Result<Value>>>,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T) -> Self {
        RpcClient { transport, next_id: 1, pending: HashMap::new() }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn call(&mut self, method: &str, params: Vec<Value>) -> RpcCall {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();
        let sent = serde_json::to_string(&Request { jsonrpc: "2.0", method, params: &params, id })
            .map_err(Error::from)
            .and_then(|msg| self.transport.send(msg));
        match sent {
            Ok(()) => {
                tracing::trace!(id, method, "rpc request sent");
                self.pending.insert(id, tx);
            }
            Err(e) => {
                tracing::debug!(id, method, error = %e, "rpc send failed");
                let _ = tx.send(Err(e));
            }
        }
        RpcCall { id, rx }
    }

    /// Settle the pending call a response belongs to.
    pub fn handle_response(&mut self, response: Response) -> Result<()> {
        let Some(tx) = self.pending.remove(&response.id) else {
            tracing::warn!(id = response.id, "response for unknown request id");
            return Ok(());
        };
        let outcome = match (response.result, response.error) {
            (_, Some(err)) => Err(Error::Remote { code: err.code, message: err.message, data: err.data }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(Error::MalformedResponse {
                message: format!("response {} has neither result nor error", response.id),
            }),
        };
        // a malformed response is also a protocol error for the caller
        let malformed = match &outcome {
            Err(e @ Error::MalformedResponse { .. }) => Some(e.clone()),
            _ => None,
        };
        let _ = tx.send(outcome);
        malformed.map_or(Ok(()), Err)
    }

    pub fn handle_response_str(&mut self, raw: &str) -> Result<()> {
        let response: Response =
            serde_json::from_str(raw).map_err(|e| Error::MalformedResponse { message: e.to_string() })?;
        self.handle_response(response)
    }

    /// Reject one pending call, e.g. after a transport-level exception.
    pub fn fail(&mut self, id: u64, error: Error) -> bool {
        match self.pending.remove(&id) {
            Some(tx) => {
                let _ = tx.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Reject every pending call with `RequestAbandoned`.
    pub fn abandon_all(&mut self) {
        for (id, tx) in self.pending.drain() {
            let _ = tx.send(Err(Error::RequestAbandoned { id }));
        }
    }
}

#[must_use = "futures do nothing unless polled"]
pub struct RpcCall {
    id: u64,
    rx: oneshot::Receiver<Result<Value>>,
}

impl RpcCall {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for RpcCall {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match self.rx.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // sender dropped with the client
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(Error::RequestAbandoned { id })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn client() -> (RpcClient<impl FnMut(String) -> Result<()>>, Rc<RefCell<Vec<String>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let log = sent.clone();
        let c = RpcClient::new(move |m: String| -> Result<()> {
            log.borrow_mut().push(m);
            Ok(())
        });
        (c, sent)
    }

    #[test]
    fn ids_are_sequential_per_client() {
        let (mut c, sent) = client();
        let a = c.call("a", vec![]);
        let b = c.call("b", vec![json!(1)]);
        assert_eq!((a.id(), b.id()), (1, 2));
        let first: Value = serde_json::from_str(&sent.borrow()[0]).unwrap();
        assert_eq!(first, json!({"jsonrpc": "2.0", "method": "a", "params": [], "id": 1}));
    }

    #[test]
    fn result_and_error_responses_settle_by_id() {
        let (mut c, _) = client();
        let a = c.call("a", vec![]);
        let b = c.call("b", vec![]);
        c.handle_response_str(r#"{"id":2,"error":{"code":-32000,"message":"nope"}}"#).unwrap();
        c.handle_response_str(r#"{"id":1,"result":{"ok":true}}"#).unwrap();
        assert_eq!(a.now_or_never().unwrap().unwrap(), json!({"ok": true}));
        match b.now_or_never().unwrap() {
            Err(Error::Remote { code, message, .. }) => assert_eq!((code, message.as_str()), (-32000, "nope")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn send_failure_rejects_immediately() {
        let mut c = RpcClient::new(|_m: String| -> Result<()> { Err(Error::Transport { message: "closed".into() }) });
        let call = c.call("x", vec![]);
        assert!(matches!(call.now_or_never(), Some(Err(Error::Transport { .. }))));
        assert_eq!(c.pending_count(), 0);
    }

    #[test]
    fn fail_rejects_only_the_named_request() {
        let (mut c, _) = client();
        let a = c.call("a", vec![]);
        let mut b = c.call("b", vec![]);
        assert!(c.fail(1, Error::Transport { message: "socket closed".into() }));
        assert!(!c.fail(1, Error::Transport { message: "again".into() }));
        assert!(matches!(a.now_or_never(), Some(Err(Error::Transport { .. }))));
        assert!((&mut b).now_or_never().is_none());
        assert_eq!(c.pending_count(), 1);
    }

    #[test]
    fn null_result_is_a_result() {
        let (mut c, _) = client();
        let call = c.call("x", vec![]);
        c.handle_response_str(r#"{"id":1,"result":null}"#).unwrap();
        assert_eq!(call.now_or_never().unwrap().unwrap(), Value::Null);
    }

    #[test]
    fn response_without_payload_is_malformed() {
        let (mut c, _) = client();
        let call = c.call("x", vec![]);
        assert!(matches!(c.handle_response_str(r#"{"id":1}"#), Err(Error::MalformedResponse { .. })));
        assert!(matches!(call.now_or_never(), Some(Err(Error::MalformedResponse { .. }))));
    }

    #[test]
    fn abandon_all_rejects_pending() {
        let (mut c, _) = client();
        let call = c.call("x", vec![]);
        c.abandon_all();
        assert!(matches!(call.now_or_never(), Some(Err(Error::RequestAbandoned { id: 1 }))));
    }
}
