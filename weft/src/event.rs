use crate::algorithms::patch::Operation;
use crate::error::{Error, Result};
use crate::rpc::Response;
use serde::Deserialize;
use serde_json::Value;

pub const WORKFLOW_CHANGED_EVENT: &str = "WorkflowChangedEvent";

/// A decoded patch from the push channel.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowPatch {
    pub ops: Vec<Operation>,
    /// Absent for protocols that only guarantee arrival order.
    pub snapshot_id: Option<u64>,
}

#[derive(Deserialize)]
struct PatchSer {
    ops: Vec<Operation>,
}

#[derive(Deserialize)]
struct PayloadSer {
    patch: PatchSer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventSer {
    payload: PayloadSer,
    #[serde(default)]
    snapshot_id: Option<u64>,
}

#[derive(Debug)]
pub enum Inbound {
    Response(Response),
    Patch(WorkflowPatch),
    /// Well-formed but not for this engine (other event types, notifications).
    Ignored { event_type: Option<String> },
}

pub fn decode_workflow_changed(v: Value) -> Result<WorkflowPatch> {
    let e: EventSer = serde_json::from_value(v).map_err(|e| Error::MalformedEvent { message: e.to_string() })?;
    Ok(WorkflowPatch { ops: e.payload.patch.ops, snapshot_id: e.snapshot_id })
}

/// Classify one inbound message. Events carry `eventType`, responses carry
/// an `id` and no `method`.
pub fn parse_message(raw: &str) -> Result<Inbound> {
    let v: Value = serde_json::from_str(raw).map_err(|e| Error::MalformedEvent { message: e.to_string() })?;
    let Value::Object(obj) = &v else {
        return Err(Error::MalformedEvent { message: "message is not an object".into() });
    };
    if let Some(kind) = obj.get("eventType") {
        let kind = kind.as_str().unwrap_or_default().to_string();
        if kind == WORKFLOW_CHANGED_EVENT {
            return decode_workflow_changed(v).map(Inbound::Patch);
        }
        tracing::debug!(event_type = %kind, "ignoring event");
        return Ok(Inbound::Ignored { event_type: Some(kind) });
    }
    if obj.contains_key("id") && !obj.contains_key("method") {
        let r: Response = serde_json::from_value(v).map_err(|e| Error::MalformedResponse { message: e.to_string() })?;
        return Ok(Inbound::Response(r));
    }
    Ok(Inbound::Ignored { event_type: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_events_and_responses() {
        let raw = r#"{"eventType":"WorkflowChangedEvent","payload":{"patch":{"ops":[{"op":"remove","path":"/nodes/a"}]}},"snapshotId":4}"#;
        match parse_message(raw).unwrap() {
            Inbound::Patch(p) => {
                assert_eq!(p.snapshot_id, Some(4));
                assert_eq!(p.ops, vec![Operation::Remove { path: "/nodes/a".into() }]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_message(r#"{"id":3,"result":null}"#).unwrap(), Inbound::Response(_)));
        assert!(matches!(
            parse_message(r#"{"eventType":"AppStateChangedEvent","payload":{}}"#).unwrap(),
            Inbound::Ignored { event_type: Some(_) }
        ));
    }

    #[test]
    fn unknown_op_is_malformed() {
        let raw = r#"{"eventType":"WorkflowChangedEvent","payload":{"patch":{"ops":[{"op":"move","from":"/a","path":"/b"}]}}}"#;
        assert!(matches!(parse_message(raw), Err(Error::MalformedEvent { .. })));
    }
}
