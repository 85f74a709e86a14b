//! Structural edits of array-like nodes.
//!
//! Every edit follows the same sequence: read the container through the
//! node, change it with the node's [`ArrayHandle`], write it back (flushing
//! enclosing struct cells), apply to the native layer, and queue a rebuild
//! of the node's children. Child nodes are never patched in place, so
//! element ids obtained before an edit go stale once the rebuild runs.

use inspector_core::{Value, coerce};

use crate::array::ArrayHandle;
use crate::clone::DeepCopy;
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeId, NodeKind};
use crate::object::{TreeObject, out_of_range};
use crate::rebuild::RebuildReason;

impl TreeObject {
    /// Current element count of an array-like node.
    pub fn array_size(&self, id: NodeId) -> TreeResult<usize> {
        let (handle, container, _) = self.container_of(id)?;
        Ok(handle.size(&container))
    }

    /// Resizes the container. Negative sizes clamp to zero and an
    /// unchanged size does nothing. New elements get the element type's
    /// default value. Growing a list of non-optional object references
    /// fails with [`TreeError::NoDefaultElement`]; use
    /// [`insert`](Self::insert) with a concrete instance instead.
    pub fn resize(&mut self, id: NodeId, new_size: isize) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        let new_size = new_size.max(0) as usize;
        let size = handle.size(&container);
        if size == new_size {
            return Ok(());
        }
        if new_size > size && !handle.has_default_element() {
            return Err(TreeError::NoDefaultElement(path));
        }
        let container = handle.resize(container, new_size);
        self.commit_container(id, container, RebuildReason::Resize)
    }

    /// Inserts `value` so that it ends up at `index` (`index <= len`).
    pub fn insert(&mut self, id: NodeId, index: usize, value: Value) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        let value = coerce(value, handle.element_type())?;
        let container = handle
            .insert(container, index, value)
            .map_err(|err| out_of_range(&path, err))?;
        self.commit_container(id, container, RebuildReason::Insert)
    }

    pub fn remove_at(&mut self, id: NodeId, index: usize) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        let container = handle
            .remove_at(container, index)
            .map_err(|err| out_of_range(&path, err))?;
        self.commit_container(id, container, RebuildReason::Remove)
    }

    pub fn remove_last(&mut self, id: NodeId) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        match handle.size(&container) {
            0 => Err(TreeError::IndexOutOfRange {
                path,
                index: 0,
                len: 0,
            }),
            len => self.remove_at(id, len - 1),
        }
    }

    pub fn swap(&mut self, id: NodeId, a: usize, b: usize) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        let container = handle
            .swap(container, a, b)
            .map_err(|err| out_of_range(&path, err))?;
        self.commit_container(id, container, RebuildReason::Swap)
    }

    /// Replaces one element through the container node.
    pub fn set_element_value(&mut self, id: NodeId, index: usize, value: Value) -> TreeResult<()> {
        let (handle, container, path) = self.container_of(id)?;
        let value = coerce(value, handle.element_type())?;
        let container = handle
            .set(container, index, value)
            .map_err(|err| out_of_range(&path, err))?;
        self.commit_container(id, container, RebuildReason::SetElementValue)
    }

    /// Inserts a deep copy of an element right after it.
    pub fn duplicate_element(&mut self, element: NodeId, copier: &mut dyn DeepCopy) -> TreeResult<()> {
        let node = self.node(element)?;
        let NodeKind::ArrayElement { index } = node.kind else {
            return Err(TreeError::NotElement(node.path.clone()));
        };
        let parent = node
            .parent
            .ok_or_else(|| TreeError::NotElement(node.path.clone()))?;
        let copy = copier.deep_copy(&self.get_value(element)?);
        self.insert(parent, index + 1, copy)
    }

    fn container_of(&self, id: NodeId) -> TreeResult<(ArrayHandle, Value, String)> {
        let node = self.node(id)?;
        let handle = node
            .array_handle()
            .cloned()
            .ok_or_else(|| TreeError::NotArray(node.path.clone()))?;
        let container = self.get_value_uncached(id)?;
        if container.as_elements().is_none() {
            return Err(TreeError::Uninitialized(node.path.clone()));
        }
        Ok((handle, container, node.path.clone()))
    }

    fn commit_container(&mut self, id: NodeId, container: Value, reason: RebuildReason) -> TreeResult<()> {
        let last = self.write_node(id, container)?;
        self.propagate_from(last)?;
        let path = self.node(id)?.path.clone();
        self.apply_modified_properties();
        self.push_rebuild(path, reason);
        Ok(())
    }
}
