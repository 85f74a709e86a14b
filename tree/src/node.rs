//! Tree nodes and their identifiers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};

use inspector_core::{Attributes, FieldInfo, MethodInfo, PropertyInfo, TypeDesc, Value};

use crate::array::ArrayHandle;
use crate::discovery::MemberRef;

/// Generation-tagged handle to a node in a [`TreeObject`](crate::TreeObject).
///
/// Layout: `u32 index` + `u64 generation`.
///
/// The generation is the tree's rebuild counter at the time the node was
/// created. Rebuilds free nodes and hand their slots out again under a newer
/// generation, so a handle kept across a rebuild stops resolving. Re-resolve
/// by path after any structural change.
#[derive(Clone, Copy)]
pub struct NodeId {
    index: u32,
    generation: u64,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u64) -> Self {
        Self { index, generation }
    }

    /// Slot index in the node arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Tree generation the node was created in.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl Eq for NodeId {}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@{})", self.index, self.generation)
    }
}

/// What a node wraps. Exactly one accessor per variant.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind {
    Field(MemberRef<FieldInfo>),
    Property(MemberRef<PropertyInfo>),
    Method(MemberRef<MethodInfo>),
    ArrayElement { index: usize },
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, Self::ArrayElement { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

/// Cached value plus a "needs flushing to the owner" flag.
///
/// Struct-typed members and array elements read once and keep the value,
/// so repeated reads return the same boxed instance and nested edits land
/// in one place. A write below the cell marks it dirty; the flush writes
/// the cached value back into the cell's owner.
#[derive(Debug, Default)]
pub struct ValueCell {
    value: RefCell<Option<Value>>,
    dirty: Cell<bool>,
}

impl ValueCell {
    pub(crate) fn with_value(value: Value) -> Self {
        Self {
            value: RefCell::new(Some(value)),
            dirty: Cell::new(false),
        }
    }

    pub fn get(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    pub(crate) fn set(&self, value: Value) {
        *self.value.borrow_mut() = Some(value);
    }

    /// Drops the cached value; the next read goes to the owner.
    pub(crate) fn invalidate(&self) {
        *self.value.borrow_mut() = None;
        self.dirty.set(false);
    }

    /// True if the cell currently holds a boxed struct copy.
    pub fn holds_struct(&self) -> bool {
        matches!(&*self.value.borrow(), Some(Value::Struct(_)))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }
}

/// One discovered member or array element.
#[derive(Debug)]
pub struct TreeProperty {
    pub(crate) path: String,
    pub(crate) name: String,
    pub(crate) display_name: String,
    pub(crate) kind: NodeKind,
    pub(crate) declared: TypeDesc,
    pub(crate) attributes: Attributes<'static>,
    pub(crate) parent: Option<NodeId>,
    /// Member fields for composites, elements for array-like nodes.
    pub(crate) children: Vec<NodeId>,
    pub(crate) properties: Vec<NodeId>,
    pub(crate) buttons: Vec<NodeId>,
    pub(crate) cell: Option<ValueCell>,
    pub(crate) array: Option<ArrayHandle>,
    pub(crate) has_custom_renderer: bool,
    pub(crate) depth: usize,
    /// Address of the object this node expanded, for cycle detection.
    pub(crate) expanded_addr: Option<usize>,
}

impl TreeProperty {
    /// Dotted path, with `Array.data[i]` segments for elements.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Member name (`Element i` for elements).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn declared_type(&self) -> &TypeDesc {
        &self.declared
    }

    pub fn is_array_like(&self) -> bool {
        self.declared.is_array_like()
    }

    /// Non-primitive value type.
    pub fn is_struct(&self) -> bool {
        self.declared.is_struct()
    }

    pub fn has_custom_renderer(&self) -> bool {
        self.has_custom_renderer
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Field children of a composite node, or elements of an array-like one.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn properties(&self) -> &[NodeId] {
        &self.properties
    }

    pub fn buttons(&self) -> &[NodeId] {
        &self.buttons
    }

    /// Position in the parent container, for element nodes.
    pub fn element_index(&self) -> Option<usize> {
        match self.kind {
            NodeKind::ArrayElement { index } => Some(index),
            _ => None,
        }
    }

    pub fn array_handle(&self) -> Option<&ArrayHandle> {
        self.array.as_ref()
    }

    pub fn cell(&self) -> Option<&ValueCell> {
        self.cell.as_ref()
    }

    pub fn attributes(&self) -> Attributes<'static> {
        self.attributes
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_index_and_generation() {
        assert_eq!(NodeId::new(3, 1), NodeId::new(3, 1));
        assert_ne!(NodeId::new(3, 1), NodeId::new(3, 2));
        assert_eq!(format!("{:?}", NodeId::new(3, 2)), "NodeId(3@2)");
    }

    #[test]
    fn cell_dirty_cycle() {
        let cell = ValueCell::with_value(Value::Int(1));
        assert!(!cell.holds_struct());
        cell.mark_dirty();
        assert!(cell.is_dirty());
        cell.clear_dirty();
        assert!(!cell.is_dirty());
        cell.invalidate();
        assert_eq!(cell.get(), None);
    }
}
