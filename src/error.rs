use crate::interop::{new_obj, set_kv};
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    set_kv(&root, "error", &error_object(code, message, data));
    root.into()
}

/// The `error` member on its own; rejected promises carry this.
pub fn error_object(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    e.into()
}

fn detail(err: &weft::Error) -> Option<JsValue> {
    use weft::Error::*;
    let d = new_obj();
    match err {
        InvalidPointer { path } | NotAContainer { path } => set_kv(&d, "path", &JsValue::from_str(path)),
        PathNotFound { op, path } => {
            set_kv(&d, "op", &JsValue::from_str(op));
            set_kv(&d, "path", &JsValue::from_str(path));
        }
        IndexOutOfBounds { path, index, len } => {
            set_kv(&d, "path", &JsValue::from_str(path));
            set_kv(&d, "index", &JsValue::from_f64(*index as f64));
            set_kv(&d, "len", &JsValue::from_f64(*len as f64));
        }
        Remote { code, data, .. } => {
            set_kv(&d, "code", &JsValue::from_f64(*code as f64));
            if let Some(v) = data.as_ref().and_then(|v| crate::interop::to_js(v).ok()) {
                set_kv(&d, "data", &v);
            }
        }
        WaitAbandoned { snapshot_id } => set_kv(&d, "snapshotId", &JsValue::from_f64(*snapshot_id as f64)),
        RequestAbandoned { id } => set_kv(&d, "id", &JsValue::from_f64(*id as f64)),
        UnknownObject { id } => set_kv(&d, "id", &JsValue::from_str(id)),
        _ => return None,
    }
    Some(d.into())
}

pub fn from_weft(e: &weft::Error) -> JsValue {
    err(e.code(), e.to_string(), detail(e))
}

pub fn rejection(e: &weft::Error) -> JsValue {
    error_object(e.code(), e.to_string(), detail(e))
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn invalid_direction(got: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "got", &JsValue::from_str(got));
    err("invalid_direction", "direction must be top, bottom, left or right", Some(d.into()))
}

#[inline]
pub fn invalid_argument(param: &str, message: impl Into<String>) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("invalid_argument", message, Some(d.into()))
}
