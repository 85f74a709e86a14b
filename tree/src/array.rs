//! Uniform access to fixed-size arrays and growable lists.
//!
//! Containers travel as [`Value::Array`] or [`Value::List`]. A list is
//! edited in place. An array cannot change size, so structural edits copy
//! its elements into a temporary list and materialize a new array from it.

use inspector_core::{TypeDesc, Value};

/// Which representation a container uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Fixed-size (`Box<[T]>`).
    Array,
    /// Growable (`Vec<T>`).
    List,
}

/// An index was outside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub len: usize,
}

/// Reflection handle over one array-like member.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayHandle {
    element: TypeDesc,
    kind: ContainerKind,
}

impl ArrayHandle {
    /// Handle for a declared list or array type (optionals are unwrapped).
    pub fn from_desc(desc: &TypeDesc) -> Option<Self> {
        match desc.unwrap_optional() {
            TypeDesc::List(elem) => Some(Self {
                element: (**elem).clone(),
                kind: ContainerKind::List,
            }),
            TypeDesc::Array(elem) => Some(Self {
                element: (**elem).clone(),
                kind: ContainerKind::Array,
            }),
            _ => None,
        }
    }

    pub fn element_type(&self) -> &TypeDesc {
        &self.element
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn is_list_kind(&self) -> bool {
        self.kind == ContainerKind::List
    }

    /// Element count; zero for anything that is not a container.
    pub fn size(&self, container: &Value) -> usize {
        container.as_elements().map_or(0, <[Value]>::len)
    }

    pub fn element_at(&self, container: &Value, index: usize) -> Option<Value> {
        container.as_elements()?.get(index).cloned()
    }

    /// Wraps elements in this handle's container representation.
    pub fn wrap(&self, items: Vec<Value>) -> Value {
        match self.kind {
            ContainerKind::Array => Value::Array(items),
            ContainerKind::List => Value::List(items),
        }
    }

    /// Default value for a new element.
    pub fn default_element(&self) -> Value {
        self.element.default_value()
    }

    /// Whether growing the container can fill new slots. Untyped object
    /// references default to null, which only an optional element accepts.
    pub fn has_default_element(&self) -> bool {
        self.element.is_nullable() || !self.default_element().is_null()
    }

    fn items(container: Value) -> Vec<Value> {
        container.into_elements().unwrap_or_default()
    }

    /// Replaces one element in place.
    pub fn set(&self, container: Value, index: usize, value: Value) -> Result<Value, IndexOutOfBounds> {
        let mut items = Self::items(container);
        let len = items.len();
        let slot = items.get_mut(index).ok_or(IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(self.wrap(items))
    }

    /// Inserts at `index` (`index == len` appends).
    pub fn insert(&self, container: Value, index: usize, value: Value) -> Result<Value, IndexOutOfBounds> {
        let items = Self::items(container);
        let len = items.len();
        if index > len {
            return Err(IndexOutOfBounds { index, len });
        }
        Ok(self.restructure(items, |list| list.insert(index, value)))
    }

    pub fn remove_at(&self, container: Value, index: usize) -> Result<Value, IndexOutOfBounds> {
        let items = Self::items(container);
        let len = items.len();
        if index >= len {
            return Err(IndexOutOfBounds { index, len });
        }
        Ok(self.restructure(items, |list| {
            list.remove(index);
        }))
    }

    /// Exchanges two elements.
    pub fn swap(&self, container: Value, a: usize, b: usize) -> Result<Value, IndexOutOfBounds> {
        let mut items = Self::items(container);
        let len = items.len();
        for index in [a, b] {
            if index >= len {
                return Err(IndexOutOfBounds { index, len });
            }
        }
        match self.kind {
            ContainerKind::List => items.swap(a, b),
            ContainerKind::Array => {
                let first = items[a].clone();
                let second = std::mem::replace(&mut items[b], first);
                items[a] = second;
            }
        }
        Ok(self.wrap(items))
    }

    /// Truncates or pads with default elements.
    pub fn resize(&self, container: Value, new_len: usize) -> Value {
        let items = Self::items(container);
        self.restructure(items, |list| list.resize_with(new_len, || self.default_element()))
    }

    fn restructure(&self, mut items: Vec<Value>, edit: impl FnOnce(&mut Vec<Value>)) -> Value {
        match self.kind {
            ContainerKind::List => {
                edit(&mut items);
                Value::List(items)
            }
            ContainerKind::Array => {
                let mut temp: Vec<Value> = Vec::with_capacity(items.len() + 1);
                temp.extend(items);
                edit(&mut temp);
                Value::Array(temp)
            }
        }
    }
}
