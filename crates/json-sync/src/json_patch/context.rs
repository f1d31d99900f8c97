//! Per-call execution contexts.
//!
//! An [`ApplyContext`] owns the working root for one apply (or invert) call.
//! It starts as a shallow clone of the input document, so every container
//! is shared with the input. A container is copied the first time it is
//! written (`Arc::make_mut`); after that the working root owns it uniquely
//! and later writes in the same call go straight to the copy. The input
//! document is never modified and copies never outlive the call.

use std::sync::Arc;

use tracing::trace;

use json_sync_pointer::{format_json_pointer, is_valid_index, split_last, APPEND_STEP};
use json_sync_util::{Array, Object, Value};

use super::registry::Registry;
use super::types::{Op, PatchError};

/// A writable container resolved through the context.
pub enum Container<'a> {
    List(&'a mut Array),
    Map(&'a mut Object),
}

pub struct ApplyContext<'r> {
    root: Value,
    registry: &'r Registry,
    create_missing_objects: bool,
    copies: usize,
}

impl<'r> ApplyContext<'r> {
    pub fn new(doc: &Value, registry: &'r Registry) -> Self {
        Self {
            root: doc.clone(),
            registry,
            create_missing_objects: false,
            copies: 0,
        }
    }

    /// Synthesize missing intermediate maps when resolving a parent path.
    pub fn create_missing_objects(mut self, enabled: bool) -> Self {
        self.create_missing_objects = enabled;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_root(self) -> Value {
        self.root
    }

    /// Number of containers copied so far in this call.
    pub fn copies(&self) -> usize {
        self.copies
    }

    pub fn get(&self, path: &[String]) -> Option<&Value> {
        self.root.get(path)
    }

    /// Dispatch `op` to its handler.
    pub fn apply_op(&mut self, op: &Op) -> Result<(), PatchError> {
        let registry = self.registry;
        registry.handler(&op.op)?.apply(self, op)
    }

    /// Replace the whole document. Writing an equal value keeps the current
    /// root.
    pub fn set_root(&mut self, value: Value) {
        if self.root != value {
            self.root = value;
        }
    }

    /// Resolve the container at `parent` for writing.
    ///
    /// Every container on the way down is made unique to the working root.
    pub fn container_mut(&mut self, parent: &[String]) -> Result<Container<'_>, PatchError> {
        if !self.create_missing_objects {
            // Validate before copying anything so a failed lookup leaves the
            // working root untouched.
            match self.root.get(parent) {
                None => return Err(PatchError::NotFound(format_json_pointer(parent))),
                Some(Value::Array(_)) | Some(Value::Object(_)) => {}
                Some(_) => return Err(PatchError::InvalidTarget(format_json_pointer(parent))),
            }
        }

        let create = self.create_missing_objects;
        let copies = &mut self.copies;
        let mut current: &mut Value = &mut self.root;
        for (depth, step) in parent.iter().enumerate() {
            current = match current {
                Value::Object(map) => {
                    let map = unshare(map, copies);
                    if create {
                        map.entry(step.clone()).or_insert_with(Value::object)
                    } else {
                        map.get_mut(step).ok_or_else(|| {
                            PatchError::NotFound(format_json_pointer(&parent[..=depth]))
                        })?
                    }
                }
                Value::Array(list) => {
                    let list = unshare(list, copies);
                    let index = parse_index(step)
                        .ok_or_else(|| PatchError::InvalidIndex(format_json_pointer(&parent[..=depth])))?;
                    list.get_mut(index).ok_or_else(|| {
                        PatchError::NotFound(format_json_pointer(&parent[..=depth]))
                    })?
                }
                _ => return Err(PatchError::NotFound(format_json_pointer(&parent[..=depth]))),
            };
        }

        match current {
            Value::Object(map) => Ok(Container::Map(unshare(map, copies))),
            Value::Array(list) => Ok(Container::List(unshare(list, copies))),
            _ => Err(PatchError::InvalidTarget(format_json_pointer(parent))),
        }
    }

    /// `add` semantics: insert into a list (`-` appends) or set a map key.
    /// The root path replaces the document.
    pub fn insert(&mut self, path: &[String], value: Value) -> Result<(), PatchError> {
        let Some((parent, key)) = split_last(path) else {
            self.set_root(value);
            return Ok(());
        };
        match self.container_mut(parent)? {
            Container::List(list) => {
                let index = if key == APPEND_STEP {
                    list.len()
                } else {
                    parse_index(key)
                        .filter(|i| *i <= list.len())
                        .ok_or_else(|| PatchError::InvalidIndex(format_json_pointer(path)))?
                };
                list.insert(index, value);
            }
            Container::Map(map) => {
                map.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// `replace` semantics: overwrite an existing list element or set a map
    /// key (created when absent). The root path replaces the document.
    pub fn set(&mut self, path: &[String], value: Value) -> Result<(), PatchError> {
        let Some((parent, key)) = split_last(path) else {
            self.set_root(value);
            return Ok(());
        };
        if let Some(Value::Array(list)) = self.get(parent) {
            existing_index(key, list.len(), path)?;
        }
        match self.container_mut(parent)? {
            Container::List(list) => {
                let index = existing_index(key, list.len(), path)?;
                list[index] = value;
            }
            Container::Map(map) => {
                map.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// `remove` semantics. Returns the removed value.
    pub fn remove(&mut self, path: &[String]) -> Result<Value, PatchError> {
        let Some((parent, key)) = split_last(path) else {
            return Err(PatchError::InvalidTarget(String::new()));
        };
        match self.get(parent) {
            Some(Value::Array(list)) => {
                existing_index(key, list.len(), path)?;
            }
            Some(Value::Object(map)) if !map.contains_key(key) => {
                return Err(PatchError::NotFound(format_json_pointer(path)));
            }
            _ => {}
        }
        match self.container_mut(parent)? {
            Container::List(list) => {
                let index = existing_index(key, list.len(), path)?;
                Ok(list.remove(index))
            }
            Container::Map(map) => map
                .shift_remove(key)
                .ok_or_else(|| PatchError::NotFound(format_json_pointer(path))),
        }
    }
}

fn unshare<'a, T: Clone>(container: &'a mut Arc<T>, copies: &mut usize) -> &'a mut T {
    if Arc::strong_count(container) > 1 {
        *copies += 1;
        trace!(copies = *copies, "copy-on-write");
    }
    Arc::make_mut(container)
}

fn parse_index(step: &str) -> Option<usize> {
    if is_valid_index(step) {
        step.parse().ok()
    } else {
        None
    }
}

fn existing_index(key: &str, len: usize, path: &[String]) -> Result<usize, PatchError> {
    let index = parse_index(key).ok_or_else(|| PatchError::InvalidIndex(format_json_pointer(path)))?;
    if index >= len {
        return Err(PatchError::NotFound(format_json_pointer(path)));
    }
    Ok(index)
}

/// What an operation handler sees when asked for its inverse.
///
/// All values are taken from the document as it was immediately before the
/// operation ran.
pub struct InvertInput<'a> {
    pub op: &'a Op,
    /// The value at `op.path`, if any.
    pub prior: Option<&'a Value>,
    /// The container holding `op.path`'s last step, if any.
    pub parent: Option<&'a Value>,
    /// True when `parent` is a list.
    pub is_index: bool,
    pub doc: &'a Value,
}
