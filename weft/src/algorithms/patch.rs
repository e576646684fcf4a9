//! Path-addressed patch application onto a `serde_json::Value` tree.
//!
//! Paths are JSON pointers. Operations in one patch apply strictly in order
//! and the engine never awaits, so readers on the same thread cannot observe
//! a half-applied patch. A path that does not resolve is a protocol error and
//! is returned, never skipped.

use crate::error::{Error, Result};
use crate::geometry::limits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Add { path: String, value: Value },
    Replace { path: String, value: Value },
    Remove { path: String },
}

impl Operation {
    pub fn path(&self) -> &str {
        match self {
            Operation::Add { path, .. } | Operation::Replace { path, .. } | Operation::Remove { path } => path,
        }
    }

    fn path_mut(&mut self) -> &mut String {
        match self {
            Operation::Add { path, .. } | Operation::Replace { path, .. } | Operation::Remove { path } => path,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Replace { .. } => "replace",
            Operation::Remove { .. } => "remove",
        }
    }
}

/// Split a pointer into unescaped segments. `""` is the root (no segments).
pub fn parse_pointer(path: &str) -> Result<Vec<String>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(Error::InvalidPointer { path: path.to_string() });
    };
    let mut out = Vec::new();
    for raw in rest.split('/') {
        let mut seg = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '~' {
                match chars.next() {
                    Some('0') => seg.push('~'),
                    Some('1') => seg.push('/'),
                    _ => return Err(Error::InvalidPointer { path: path.to_string() }),
                }
            } else {
                seg.push(c);
            }
        }
        out.push(seg);
    }
    if out.len() > limits::MAX_POINTER_DEPTH {
        return Err(Error::PointerTooDeep { depth: out.len(), max: limits::MAX_POINTER_DEPTH });
    }
    Ok(out)
}

fn parse_index(seg: &str) -> Option<usize> {
    let canonical = seg == "0" || (!seg.is_empty() && !seg.starts_with('0') && seg.bytes().all(|b| b.is_ascii_digit()));
    if canonical { seg.parse().ok() } else { None }
}

/// Walk to the parent container of the last segment. `add` creates missing
/// intermediate objects; other ops require every step to exist.
fn resolve_parent<'v>(root: &'v mut Value, segs: &[String], op: &'static str, path: &str, create: bool) -> Result<&'v mut Value> {
    let mut cur = root;
    for seg in segs {
        cur = match cur {
            Value::Object(map) => {
                if create && !map.contains_key(seg.as_str()) {
                    map.insert(seg.clone(), Value::Object(Map::new()));
                }
                match map.get_mut(seg.as_str()) {
                    Some(v) => v,
                    None => return Err(Error::PathNotFound { op, path: path.to_string() }),
                }
            }
            Value::Array(arr) => {
                let len = arr.len();
                let Some(i) = parse_index(seg) else {
                    return Err(Error::PathNotFound { op, path: path.to_string() });
                };
                match arr.get_mut(i) {
                    Some(v) => v,
                    None => return Err(Error::IndexOutOfBounds { path: path.to_string(), index: i, len }),
                }
            }
            _ => return Err(Error::NotAContainer { path: path.to_string() }),
        };
    }
    Ok(cur)
}

pub fn apply_operation(state: &mut Value, op: &Operation) -> Result<()> {
    let path = op.path();
    let segs = parse_pointer(path)?;
    let Some((last, parents)) = segs.split_last() else {
        return match op {
            Operation::Add { value, .. } | Operation::Replace { value, .. } => {
                *state = value.clone();
                Ok(())
            }
            Operation::Remove { .. } => Err(Error::InvalidPointer { path: path.to_string() }),
        };
    };
    let name = op.name();
    let parent = resolve_parent(state, parents, name, path, matches!(op, Operation::Add { .. }))?;
    match (op, parent) {
        (Operation::Add { value, .. }, Value::Object(map)) => {
            map.insert(last.clone(), value.clone());
        }
        (Operation::Add { value, .. }, Value::Array(arr)) => {
            if last == "-" {
                arr.push(value.clone());
            } else {
                let i = parse_index(last).ok_or_else(|| Error::PathNotFound { op: name, path: path.to_string() })?;
                if i > arr.len() {
                    return Err(Error::IndexOutOfBounds { path: path.to_string(), index: i, len: arr.len() });
                }
                arr.insert(i, value.clone());
            }
        }
        (Operation::Replace { value, .. }, Value::Object(map)) => match map.get_mut(last.as_str()) {
            Some(slot) => *slot = value.clone(),
            None => return Err(Error::PathNotFound { op: name, path: path.to_string() }),
        },
        (Operation::Replace { value, .. }, Value::Array(arr)) => {
            let len = arr.len();
            let i = parse_index(last).ok_or_else(|| Error::PathNotFound { op: name, path: path.to_string() })?;
            match arr.get_mut(i) {
                Some(slot) => *slot = value.clone(),
                None => return Err(Error::IndexOutOfBounds { path: path.to_string(), index: i, len }),
            }
        }
        (Operation::Remove { .. }, Value::Object(map)) => {
            // shift_remove keeps the remaining keys in order
            if map.shift_remove(last.as_str()).is_none() {
                return Err(Error::PathNotFound { op: name, path: path.to_string() });
            }
        }
        (Operation::Remove { .. }, Value::Array(arr)) => {
            let i = parse_index(last).ok_or_else(|| Error::PathNotFound { op: name, path: path.to_string() })?;
            if i >= arr.len() {
                return Err(Error::IndexOutOfBounds { path: path.to_string(), index: i, len: arr.len() });
            }
            arr.remove(i);
        }
        (_, _) => return Err(Error::NotAContainer { path: path.to_string() }),
    }
    Ok(())
}

/// Apply `ops` in order. Stops at the first failing operation; earlier
/// operations stay applied, so callers must treat an error as divergence.
pub fn apply_patch(state: &mut Value, ops: &[Operation]) -> Result<()> {
    if ops.len() > limits::MAX_PATCH_OPS {
        return Err(Error::PatchTooLarge { ops: ops.len(), max: limits::MAX_PATCH_OPS });
    }
    for op in ops {
        apply_operation(state, op)?;
    }
    Ok(())
}

/// Rewrites every operation path under a fixed root before it reaches the
/// engine, so the engine itself stays prefix-agnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    /// Trailing slashes are dropped; `""` and `"/"` mean no prefix. A
    /// prefix without a leading `/` gets one.
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        PathPrefix { prefix }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Prefix a pointer. Only `""` and `/`-rooted pointers are accepted, so a
    /// relative path cannot be glued onto the last prefix segment.
    pub fn rewrite_path(&self, path: &str) -> Result<String> {
        if !path.is_empty() && !path.starts_with('/') {
            return Err(Error::InvalidPointer { path: path.to_string() });
        }
        Ok(format!("{}{}", self.prefix, path))
    }

    pub fn rewrite(&self, ops: impl IntoIterator<Item = Operation>) -> Result<Vec<Operation>> {
        ops.into_iter()
            .map(|mut op| {
                let p = op.path_mut();
                *p = self.rewrite_path(p)?;
                Ok(op)
            })
            .collect()
    }

    pub fn apply(&self, state: &mut Value, ops: impl IntoIterator<Item = Operation>) -> Result<()> {
        apply_patch(state, &self.rewrite(ops)?)
    }
}
