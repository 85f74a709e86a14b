//! # Inspector Tree
//!
//! The model behind a property inspector. A [`TreeObject`] discovers the
//! inspectable members of a target through its static descriptor tables,
//! builds a tree of [`TreeProperty`] nodes mirroring nested structs,
//! objects and arrays, and routes every read and write through that tree.
//!
//! ## Key Types
//!
//! - [`TreeObject`] - root of one inspected target; owns all nodes
//! - [`TreeProperty`] - one member or array element
//! - [`NodeId`] - generation-tagged node handle
//! - [`ArrayHandle`] - uniform access to `Vec<T>` and `Box<[T]>` members
//! - [`RebuildQueue`] - deferred child rebuilds, drained once per UI tick
//! - [`NativeLayer`] - seam to the host serializer
//!
//! ## Example
//!
//! ```ignore
//! use inspector_core::{Inspectable, Value};
//! use inspector_tree::TreeObject;
//!
//! #[derive(Clone, Default, Inspectable)]
//! struct Bag {
//!     pub items: Vec<i32>,
//! }
//!
//! let mut tree = TreeObject::new(Bag::default());
//! let items = tree.find_property("items").unwrap();
//! tree.insert(items, 0, Value::Int(4))?;
//! tree.process_pending_rebuilds();
//! assert!(tree.find_property("items.Array.data[0]").is_some());
//! ```

mod array;
mod clone;
mod discovery;
mod error;
mod events;
mod mutation;
mod names;
mod native;
mod node;
mod object;
mod rebuild;
mod settings;

pub use array::{ArrayHandle, ContainerKind, IndexOutOfBounds};
pub use clone::{DeepCopy, ReflectCloner};
pub use discovery::{
    Discovery, DiscoveryScratch, MemberRef, Members, discover, is_button, is_inspected_field,
    is_serialized, is_shown,
};
pub use error::{TreeError, TreeResult};
pub use events::ValueChanged;
pub use names::nicify;
pub use native::{NativeLayer, NativeProperty, Snapshot, SnapshotLayer};
pub use node::{NodeId, NodeKind, TreeProperty, ValueCell};
pub use object::TreeObject;
pub use rebuild::{RebuildQueue, RebuildReason, RebuildRequest};
pub use settings::TreeSettings;
