//! Seam to the host's native serialization layer.
//!
//! The tree never formats or persists anything itself. When the inspected
//! target is native, [`TreeObject::apply_modified_properties`](crate::TreeObject::apply_modified_properties)
//! drives a [`NativeLayer`] through a fixed sequence: refresh, then commit
//! without an undo entry, then mark the target dirty.
//!
//! [`SnapshotLayer`] is a self-contained implementation that keeps a serde
//! [`Snapshot`] of the serialized state.

use std::cell::RefCell;
use std::rc::Rc;

use inspector_core::{Instance, Value, declaring_part};
use serde::{Deserialize, Serialize};

use crate::discovery::is_serialized;
#[cfg(feature = "serialize-ron")]
use crate::error::{TreeError, TreeResult};

/// Native-side view of one serialized property.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeProperty {
    pub path: String,
    pub data: Snapshot,
}

/// Host serialization engine, as seen by the tree.
pub trait NativeLayer {
    /// Native handle for a property path, if the layer knows it.
    fn resolve(&self, path: &str) -> Option<NativeProperty>;
    /// Pull the target's current state into the layer.
    fn refresh(&mut self, target: &Instance);
    /// Push pending changes without recording an undo step.
    fn commit_without_undo(&mut self, target: &Instance);
    /// Flag the target as needing to be saved.
    fn mark_dirty(&mut self, target: &Instance);
}

/// Serialized form of a value.
///
/// Objects become [`Snapshot::Map`]s of their serialized fields, base fields
/// first. Shared references that loop back to an object already being
/// captured are written as [`Snapshot::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Enum(String),
    Type(String),
    Seq(Vec<Snapshot>),
    Map(Vec<(String, Snapshot)>),
}

impl Snapshot {
    pub fn capture(value: &Value) -> Self {
        Self::capture_with(value, &mut Vec::new())
    }

    fn capture_with(value: &Value, visiting: &mut Vec<usize>) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(v) => Self::Int(*v),
            Value::UInt(v) => Self::UInt(*v),
            Value::Float(v) => Self::Float(*v),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Enum(e) => Self::Enum(
                e.variant_name()
                    .map_or_else(|| e.discriminant.to_string(), str::to_owned),
            ),
            Value::Type(info) => Self::Type(info.type_path.to_owned()),
            Value::List(items) | Value::Array(items) => Self::Seq(
                items
                    .iter()
                    .map(|item| Self::capture_with(item, visiting))
                    .collect(),
            ),
            Value::Struct(instance) | Value::Object(instance) => {
                Self::capture_instance(instance, visiting)
            }
        }
    }

    fn capture_instance(instance: &Instance, visiting: &mut Vec<usize>) -> Self {
        let addr = instance.addr();
        if visiting.contains(&addr) {
            return Self::Null;
        }
        visiting.push(addr);

        let info = instance.type_info();
        let mut chain = Vec::new();
        let mut current = Some(info);
        while let Some(level) = current {
            chain.push(level);
            current = level.base_info();
        }

        let mut entries = Vec::new();
        for level in chain.into_iter().rev() {
            for field in level.fields.iter().filter(|f| is_serialized(f)) {
                let value = {
                    let object = instance.borrow();
                    declaring_part(&*object, level).and_then(|part| (field.get)(part))
                };
                let snapshot = match value {
                    Some(value) => Self::capture_with(&value, visiting),
                    None => Self::Null,
                };
                entries.push((field.name.to_owned(), snapshot));
            }
        }

        visiting.pop();
        Self::Map(entries)
    }

    /// Looks up a property path (`a.b.Array.data[2].c`).
    pub fn resolve(&self, path: &str) -> Option<&Snapshot> {
        let mut current = self;
        let mut segments = path.split('.');
        while let Some(segment) = segments.next() {
            current = if segment == "Array" {
                let index = segments
                    .next()?
                    .strip_prefix("data[")?
                    .strip_suffix(']')?
                    .parse::<usize>()
                    .ok()?;
                match current {
                    Self::Seq(items) => items.get(index)?,
                    _ => return None,
                }
            } else {
                match current {
                    Self::Map(entries) => &entries.iter().find(|(name, _)| name == segment)?.1,
                    _ => return None,
                }
            };
        }
        Some(current)
    }
}

#[derive(Debug, Default)]
struct SnapshotState {
    pending: Option<Snapshot>,
    committed: Option<Snapshot>,
    dirty: bool,
    commit_count: usize,
}

/// In-memory native layer.
///
/// Clones share state, so a host can keep a handle after giving the layer
/// to a [`TreeObject`](crate::TreeObject).
#[derive(Debug, Clone, Default)]
pub struct SnapshotLayer {
    state: Rc<RefCell<SnapshotState>>,
}

impl SnapshotLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().dirty
    }

    /// Clears the dirty flag, as a save would.
    pub fn clear_dirty(&self) {
        self.state.borrow_mut().dirty = false;
    }

    pub fn commit_count(&self) -> usize {
        self.state.borrow().commit_count
    }

    /// Last committed state.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.state.borrow().committed.clone()
    }

    /// Last committed state as pretty RON.
    #[cfg(feature = "serialize-ron")]
    pub fn to_ron(&self) -> TreeResult<String> {
        let state = self.state.borrow();
        let snapshot = state.committed.as_ref().unwrap_or(&Snapshot::Null);
        ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
            .map_err(|e| TreeError::Serialization(e.to_string()))
    }
}

impl NativeLayer for SnapshotLayer {
    fn resolve(&self, path: &str) -> Option<NativeProperty> {
        let state = self.state.borrow();
        let data = state.committed.as_ref()?.resolve(path)?.clone();
        Some(NativeProperty {
            path: path.to_owned(),
            data,
        })
    }

    fn refresh(&mut self, target: &Instance) {
        let snapshot = Snapshot::capture(&Value::Object(target.clone()));
        self.state.borrow_mut().pending = Some(snapshot);
    }

    fn commit_without_undo(&mut self, _target: &Instance) {
        let mut state = self.state.borrow_mut();
        if let Some(pending) = state.pending.take() {
            state.committed = Some(pending);
            state.commit_count += 1;
        }
    }

    fn mark_dirty(&mut self, _target: &Instance) {
        self.state.borrow_mut().dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspector_core::Inspectable;

    #[derive(Clone, Default, Inspectable)]
    struct Slot {
        pub count: u32,
    }

    #[derive(Clone, Default, Inspectable)]
    struct Bag {
        pub label: String,
        pub slots: Vec<Slot>,
        #[inspect(skip)]
        pub transient: i32,
    }

    fn sample() -> Instance {
        Instance::new(Bag {
            label: "pack".into(),
            slots: vec![Slot { count: 2 }, Slot { count: 5 }],
            transient: 9,
        })
    }

    #[test]
    fn capture_skips_non_serialized() {
        let snapshot = Snapshot::capture(&Value::Object(sample()));
        let Snapshot::Map(entries) = &snapshot else {
            panic!("expected map");
        };
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["label", "slots"]);
    }

    #[test]
    fn resolve_array_paths() {
        let snapshot = Snapshot::capture(&Value::Object(sample()));
        assert_eq!(
            snapshot.resolve("slots.Array.data[1].count"),
            Some(&Snapshot::UInt(5))
        );
        assert_eq!(snapshot.resolve("slots.Array.data[7]"), None);
        assert_eq!(snapshot.resolve("slots.Array.bogus"), None);
    }

    #[test]
    fn layer_commits_and_marks_dirty() {
        let mut layer = SnapshotLayer::new();
        let handle = layer.clone();
        let target = sample();
        assert!(layer.resolve("label").is_none());

        layer.refresh(&target);
        layer.commit_without_undo(&target);
        layer.mark_dirty(&target);

        assert!(handle.is_dirty());
        assert_eq!(handle.commit_count(), 1);
        assert_eq!(
            handle.resolve("label").map(|p| p.data),
            Some(Snapshot::Str("pack".into()))
        );
        handle.clear_dirty();
        assert!(!layer.is_dirty());
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn exports_ron() {
        let mut layer = SnapshotLayer::new();
        let target = sample();
        layer.refresh(&target);
        layer.commit_without_undo(&target);
        let text = layer.to_ron().unwrap();
        assert!(text.contains("pack"));
    }
}
