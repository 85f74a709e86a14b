//! The inspector tree root.
//!
//! A [`TreeObject`] owns every [`TreeProperty`] discovered under one target
//! in a generational arena and hands out [`NodeId`]s into it. All reads and
//! writes go through the root, because a node's value depends on its
//! parent chain: top-level members read from the target, nested members
//! read from their parent node's value.
//!
//! Struct-typed members and array elements keep their value in a
//! [`ValueCell`]. Writing below such a node modifies the cached copy; the
//! write then walks up the parent chain, flushing every struct cell into its
//! owner, until it reaches a reference or the root target.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use inspector_core::{
    Attribute, Attributes, CustomRenderer, DisplayName, GetFn, Inspectable, Instance, Reflected,
    TypeDesc, TypeInfo, Value, coerce, declaring_part, declaring_part_mut,
};

use crate::array::{ArrayHandle, IndexOutOfBounds};
use crate::discovery::{Discovery, Members};
use crate::error::{TreeError, TreeResult};
use crate::events::{RedrawCallback, ValueChanged, ValueChangedCallback};
use crate::names::nicify;
use crate::native::{NativeLayer, NativeProperty};
use crate::node::{NodeId, NodeKind, TreeProperty, ValueCell};
use crate::rebuild::{RebuildQueue, RebuildReason, RebuildRequest};
use crate::settings::TreeSettings;

struct Slot {
    generation: u64,
    node: Option<TreeProperty>,
}

/// Everything a node needs before it is placed in the arena.
struct NodeSeed {
    kind: NodeKind,
    name: String,
    display_name: String,
    declared: TypeDesc,
    attributes: Attributes<'static>,
    path: String,
    cell: Option<ValueCell>,
}

impl NodeSeed {
    fn member(
        kind: NodeKind,
        name: &'static str,
        declared: TypeDesc,
        attributes: Attributes<'static>,
        prefix: &str,
    ) -> Self {
        let path = if prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{prefix}.{name}")
        };
        let display_name = attributes
            .get::<DisplayName>()
            .map_or_else(|| nicify(name), |d| d.0.to_owned());
        let cell = (declared.is_struct() && !kind.is_method()).then(ValueCell::default);
        Self {
            kind,
            name: name.to_owned(),
            display_name,
            declared,
            attributes,
            path,
            cell,
        }
    }

    fn element(
        index: usize,
        value: Value,
        declared: TypeDesc,
        attributes: Attributes<'static>,
        container_path: &str,
    ) -> Self {
        let name = format!("Element {index}");
        Self {
            kind: NodeKind::ArrayElement { index },
            display_name: name.clone(),
            name,
            declared,
            attributes,
            path: format!("{container_path}.Array.data[{index}]"),
            cell: Some(ValueCell::with_value(value)),
        }
    }
}

/// Root of an inspector tree for one target.
pub struct TreeObject {
    target: Instance,
    info: &'static TypeInfo,
    native: Option<Box<dyn NativeLayer>>,
    parent: Option<Rc<RefCell<TreeObject>>>,
    /// Where this tree's target sits in `parent`.
    parent_path: Option<String>,

    slots: Vec<Slot>,
    free: Vec<u32>,
    generation: u64,

    fields: Vec<NodeId>,
    properties: Vec<NodeId>,
    buttons: Vec<NodeId>,
    paths: HashMap<String, NodeId>,

    discovery: Discovery,
    rebuilds: RebuildQueue,
    settings: TreeSettings,
    on_redraw: Option<RedrawCallback>,
    on_value_changed: Option<ValueChangedCallback>,
}

impl TreeObject {
    /// Builds a tree over a plain value.
    pub fn new<T: Inspectable>(value: T) -> Self {
        Self::from_instance(Instance::new(value))
    }

    /// Builds a tree over an existing shared instance.
    pub fn from_instance(target: Instance) -> Self {
        Self::with_settings(target, None, TreeSettings::default())
    }

    /// Builds a tree whose edits are committed through `layer`.
    pub fn native(target: Instance, layer: impl NativeLayer + 'static) -> Self {
        Self::with_settings(target, Some(Box::new(layer)), TreeSettings::default())
    }

    pub fn with_settings(
        target: Instance,
        native: Option<Box<dyn NativeLayer>>,
        settings: TreeSettings,
    ) -> Self {
        let mut tree = Self {
            info: target.type_info(),
            target,
            native,
            parent: None,
            parent_path: None,
            slots: Vec::new(),
            free: Vec::new(),
            generation: 0,
            fields: Vec::new(),
            properties: Vec::new(),
            buttons: Vec::new(),
            paths: HashMap::new(),
            discovery: Discovery::new(),
            rebuilds: RebuildQueue::new(settings.coalesce_rebuilds),
            settings,
            on_redraw: None,
            on_value_changed: None,
        };
        tree.build_root();
        tree
    }

    /// Opens a nested edit session on the object held at `path` in `parent`.
    ///
    /// The nested root is never native itself; applying it applies the
    /// parent, so the outer target still gets committed and marked dirty.
    pub fn nested(parent: &Rc<RefCell<TreeObject>>, path: &str) -> TreeResult<Self> {
        let (instance, settings) = {
            let outer = parent.borrow();
            let id = outer
                .find_property(path)
                .ok_or_else(|| TreeError::PathNotFound(path.to_owned()))?;
            match outer.get_value(id)? {
                Value::Object(instance) => (instance, outer.settings.clone()),
                _ => return Err(TreeError::NotAnObject(path.to_owned())),
            }
        };
        let mut tree = Self::with_settings(instance, None, settings);
        tree.parent = Some(Rc::clone(parent));
        tree.parent_path = Some(path.to_owned());
        Ok(tree)
    }

    pub fn target(&self) -> &Instance {
        &self.target
    }

    pub fn is_native(&self) -> bool {
        self.native.is_some()
    }

    pub fn runtime_type(&self) -> &'static TypeInfo {
        self.info
    }

    pub fn parent_object(&self) -> Option<&Rc<RefCell<TreeObject>>> {
        self.parent.as_ref()
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    /// Rebuild counter. Nodes created after the last rebuild carry it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fields(&self) -> &[NodeId] {
        &self.fields
    }

    pub fn properties(&self) -> &[NodeId] {
        &self.properties
    }

    pub fn buttons(&self) -> &[NodeId] {
        &self.buttons
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&TreeProperty> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(TreeError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeProperty> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TreeError::StaleNode(id))
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Every registered path with its node.
    pub fn paths(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.paths.iter().map(|(path, id)| (path.as_str(), *id))
    }

    pub fn find_property(&self, path: &str) -> Option<NodeId> {
        self.paths.get(path).copied()
    }

    /// Native handle for `path`. Always `None` for non-native roots.
    pub fn find_native_property(&self, path: &str) -> Option<NativeProperty> {
        self.native.as_ref()?.resolve(path)
    }

    /// Registers `path`. The last registration wins.
    pub fn add_to_map(&mut self, path: impl Into<String>, id: NodeId) {
        let path = path.into();
        if let Some(previous) = self.paths.insert(path.clone(), id) {
            if previous != id && self.node(previous).is_ok() {
                log::warn!("Path '{path}' registered twice, {previous:?} replaced by {id:?}");
            }
        }
    }

    pub fn set_redraw_callback(&mut self, callback: impl FnMut() + 'static) {
        self.on_redraw = Some(Box::new(callback));
    }

    pub fn set_value_changed_callback(&mut self, callback: impl FnMut(&ValueChanged) + 'static) {
        self.on_value_changed = Some(Box::new(callback));
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    fn alloc(&mut self, node: TreeProperty) -> NodeId {
        let generation = self.generation;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = generation;
                slot.node = Some(node);
                NodeId::new(index, generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation,
                    node: Some(node),
                });
                NodeId::new(index, generation)
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return;
        };
        if slot.generation != id.generation() {
            return;
        }
        let Some(node) = slot.node.take() else {
            return;
        };
        for child in node
            .children
            .iter()
            .chain(&node.properties)
            .chain(&node.buttons)
        {
            self.free_subtree(*child);
        }
        if self.paths.get(&node.path) == Some(&id) {
            self.paths.remove(&node.path);
        }
        self.free.push(id.index());
    }

    fn build_root(&mut self) {
        let members = self.discovery.members(self.info);
        let mut ancestors = vec![self.target.addr()];
        let (fields, properties, buttons) = self.attach_members(None, &members, "", 0, &mut ancestors);
        self.fields = fields;
        self.properties = properties;
        self.buttons = buttons;
    }

    fn attach_members(
        &mut self,
        parent: Option<NodeId>,
        members: &Members,
        prefix: &str,
        depth: usize,
        ancestors: &mut Vec<usize>,
    ) -> (Vec<NodeId>, Vec<NodeId>, Vec<NodeId>) {
        let fields = members
            .fields
            .iter()
            .map(|f| {
                let seed = NodeSeed::member(
                    NodeKind::Field(*f),
                    f.info.name,
                    (f.info.ty)(),
                    Attributes::new(&f.info.attributes),
                    prefix,
                );
                self.attach(parent, seed, depth, ancestors)
            })
            .collect();
        let properties = members
            .properties
            .iter()
            .map(|p| {
                let seed = NodeSeed::member(
                    NodeKind::Property(*p),
                    p.info.name,
                    (p.info.ty)(),
                    Attributes::new(&p.info.attributes),
                    prefix,
                );
                self.attach(parent, seed, depth, ancestors)
            })
            .collect();
        let buttons = members
            .methods
            .iter()
            .map(|m| {
                let seed = NodeSeed::member(
                    NodeKind::Method(*m),
                    m.info.name,
                    (m.info.returns)(),
                    Attributes::new(&m.info.attributes),
                    prefix,
                );
                self.attach(parent, seed, depth, ancestors)
            })
            .collect();
        (fields, properties, buttons)
    }

    fn attach(
        &mut self,
        parent: Option<NodeId>,
        seed: NodeSeed,
        depth: usize,
        ancestors: &mut Vec<usize>,
    ) -> NodeId {
        let has_custom_renderer = seed.attributes.has::<CustomRenderer>()
            || seed
                .declared
                .struct_info()
                .is_some_and(|info| Attributes::new(&info.attributes).has::<CustomRenderer>());
        let array = if seed.kind.is_method() {
            None
        } else {
            ArrayHandle::from_desc(&seed.declared)
        };
        let path = seed.path.clone();
        let id = self.alloc(TreeProperty {
            path: seed.path,
            name: seed.name,
            display_name: seed.display_name,
            kind: seed.kind,
            declared: seed.declared,
            attributes: seed.attributes,
            parent,
            children: Vec::new(),
            properties: Vec::new(),
            buttons: Vec::new(),
            cell: seed.cell,
            array,
            has_custom_renderer,
            depth,
            expanded_addr: None,
        });
        self.add_to_map(path, id);
        if !seed.kind.is_method() {
            self.populate(id, ancestors);
        }
        id
    }

    /// Creates the children of `id` from its current value.
    fn populate(&mut self, id: NodeId, ancestors: &mut Vec<usize>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        let declared = node.declared.clone();
        if !declared.is_array_like() && !declared.is_composite() {
            return;
        }
        let path = node.path.clone();
        let depth = node.depth;
        let attributes = node.attributes;
        let array = node.array.clone();

        if depth >= self.settings.max_depth {
            log::warn!(
                "Not expanding '{path}': depth limit {} reached",
                self.settings.max_depth
            );
            return;
        }

        match array {
            Some(handle) => self.populate_elements(id, &path, &handle, attributes, depth, ancestors),
            None => self.populate_members(id, &path, depth, ancestors),
        }
    }

    fn populate_elements(
        &mut self,
        id: NodeId,
        path: &str,
        handle: &ArrayHandle,
        attributes: Attributes<'static>,
        depth: usize,
        ancestors: &mut Vec<usize>,
    ) {
        let container = match self.get_value(id) {
            Ok(container) => container,
            Err(err) => {
                log::warn!("Could not read container '{path}': {err}");
                return;
            }
        };
        let Some(items) = container.into_elements() else {
            log::warn!("Container '{path}' is not initialized, skipping its elements");
            return;
        };
        for (index, item) in items.into_iter().enumerate() {
            let seed = NodeSeed::element(index, item, handle.element_type().clone(), attributes, path);
            let child = self.attach(Some(id), seed, depth + 1, ancestors);
            if let Ok(node) = self.node_mut(id) {
                node.children.push(child);
            }
        }
    }

    fn populate_members(
        &mut self,
        id: NodeId,
        path: &str,
        depth: usize,
        ancestors: &mut Vec<usize>,
    ) {
        let instance = match self.get_value(id) {
            Ok(Value::Struct(instance) | Value::Object(instance)) => instance,
            Ok(_) => return,
            Err(err) => {
                log::warn!("Could not read '{path}': {err}");
                return;
            }
        };
        let addr = instance.addr();
        if ancestors.contains(&addr) {
            log::debug!("'{path}' refers back to an ancestor, not expanding");
            return;
        }
        if let Ok(node) = self.node_mut(id) {
            node.expanded_addr = Some(addr);
        }

        ancestors.push(addr);
        let members = self.discovery.members(instance.type_info());
        let (fields, properties, buttons) =
            self.attach_members(Some(id), &members, path, depth + 1, ancestors);
        ancestors.pop();

        if let Ok(node) = self.node_mut(id) {
            node.children = fields;
            node.properties = properties;
            node.buttons = buttons;
        }
    }

    /// Addresses of the objects expanded above `id`, root target included.
    fn ancestor_addrs(&self, id: NodeId) -> Vec<usize> {
        let mut addrs = vec![self.target.addr()];
        let mut current = self.node(id).ok().and_then(|n| n.parent);
        while let Some(parent) = current {
            let Ok(node) = self.node(parent) else {
                break;
            };
            addrs.extend(node.expanded_addr);
            current = node.parent;
        }
        addrs
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Current value of a node.
    ///
    /// Struct-typed members return their cached copy, so repeated reads
    /// return the same instance. Elements return the value captured at
    /// rebuild time. Methods are invoked.
    pub fn get_value(&self, id: NodeId) -> TreeResult<Value> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Method(_) => self.call_method(id, node),
            NodeKind::ArrayElement { index } => match node.cell.as_ref().and_then(ValueCell::get) {
                Some(value) => Ok(value),
                None => {
                    let value = self.read_element(node, index)?;
                    if let Some(cell) = &node.cell {
                        cell.set(value.clone());
                    }
                    Ok(value)
                }
            },
            NodeKind::Field(_) | NodeKind::Property(_) => match &node.cell {
                Some(cell) => match cell.get() {
                    Some(value) => Ok(value),
                    None => {
                        let value = self.read_member(node)?;
                        cell.set(value.clone());
                        Ok(value)
                    }
                },
                None => self.read_member(node),
            },
        }
    }

    /// Reads through to the owner, bypassing this node's cache.
    pub fn get_value_uncached(&self, id: NodeId) -> TreeResult<Value> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Method(_) => self.call_method(id, node),
            NodeKind::ArrayElement { index } => self.read_element(node, index),
            NodeKind::Field(_) | NodeKind::Property(_) => self.read_member(node),
        }
    }

    /// Like [`get_value`](Self::get_value), but `None` on any failure.
    pub fn try_get_value(&self, id: NodeId) -> Option<Value> {
        self.get_value(id).ok()
    }

    /// Typed read.
    pub fn get_as<T: Reflected>(&self, id: NodeId) -> TreeResult<T> {
        Ok(T::from_value(self.get_value(id)?)?)
    }

    /// The object `id` is read from: the root target for top-level nodes,
    /// otherwise the parent node's value.
    pub fn get_parent_object(&self, id: NodeId) -> TreeResult<Instance> {
        self.owner_instance(self.node(id)?)
    }

    fn owner_instance(&self, node: &TreeProperty) -> TreeResult<Instance> {
        let Some(parent) = node.parent else {
            return Ok(self.target.clone());
        };
        match self.get_value(parent)? {
            Value::Struct(instance) | Value::Object(instance) => Ok(instance),
            _ => Err(TreeError::MissingParent(node.path.clone())),
        }
    }

    fn read_member(&self, node: &TreeProperty) -> TreeResult<Value> {
        let (declaring, get): (&'static TypeInfo, GetFn) = match node.kind {
            NodeKind::Field(f) => (f.declaring, f.info.get),
            NodeKind::Property(p) => (p.declaring, p.info.get),
            _ => return Err(TreeError::NotAssignable(node.path.clone())),
        };
        let owner = self.owner_instance(node)?;
        let raw = {
            let object = owner.borrow();
            declaring_part(&*object, declaring).and_then(|part| get(part))
        };
        let raw = raw.ok_or_else(|| TreeError::MissingParent(node.path.clone()))?;
        Ok(coerce(raw, &node.declared)?)
    }

    fn read_element(&self, node: &TreeProperty, index: usize) -> TreeResult<Value> {
        let parent_id = node
            .parent
            .ok_or_else(|| TreeError::NotElement(node.path.clone()))?;
        let parent = self.node(parent_id)?;
        let handle = parent
            .array
            .as_ref()
            .ok_or_else(|| TreeError::NotArray(parent.path.clone()))?;
        let container = self.get_value_uncached(parent_id)?;
        handle
            .element_at(&container, index)
            .ok_or_else(|| TreeError::IndexOutOfRange {
                path: parent.path.clone(),
                index,
                len: handle.size(&container),
            })
    }

    fn call_method(&self, id: NodeId, node: &TreeProperty) -> TreeResult<Value> {
        let NodeKind::Method(method) = node.kind else {
            return Err(TreeError::NotInvocable(node.path.clone()));
        };
        let owner = self.owner_instance(node)?;
        let result = {
            let mut object = owner.borrow_mut();
            let part = declaring_part_mut(&mut *object, method.declaring)
                .ok_or_else(|| TreeError::MissingParent(node.path.clone()))?;
            (method.info.invoke)(part)
        };
        // the method may have changed a cached struct copy
        self.propagate_from(id)?;
        Ok(coerce(result.unwrap_or(Value::Null), &node.declared)?)
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Typed write. See [`set_value_dyn`](Self::set_value_dyn).
    pub fn set_value<T: Reflected>(&mut self, id: NodeId, value: T) -> TreeResult<()> {
        self.set_value_dyn(id, value.to_value())
    }

    /// Writes `value` into the node and everything that holds it.
    ///
    /// The value is coerced to the declared type, written through the
    /// member setter (or the parent container for elements) and flushed up
    /// through enclosing struct cells. Containers and composites schedule a
    /// rebuild of their children. Only scalar edits fire the value-changed
    /// callback.
    pub fn set_value_dyn(&mut self, id: NodeId, value: Value) -> TreeResult<()> {
        let node = self.node(id)?;
        if node.kind.is_method() {
            return Err(TreeError::NotAssignable(node.path.clone()));
        }
        let value = coerce(value, &node.declared)?;
        let path = node.path.clone();
        let kind = node.kind;
        let array_like = node.declared.is_array_like();
        let composite = node.declared.is_composite();
        let parent_path = node
            .parent
            .and_then(|p| self.node(p).ok())
            .map(|p| p.path.clone());
        let previous = self.try_get_value(id);

        if kind.is_element() {
            let last = self.write_node(id, value.clone())?;
            self.propagate_from(last)?;
            if let Some(parent_path) = parent_path {
                self.rebuilds.push(parent_path, RebuildReason::SetElementValue);
            }
        } else {
            let node = self.node(id)?;
            self.write_member(node, value.clone())?;
            if let Some(cell) = &node.cell {
                cell.set(value.clone());
            }
            self.propagate_from(id)?;
        }

        if array_like || composite {
            self.invalidate_descendants(id);
            self.rebuilds.push(path.clone(), RebuildReason::SetValue);
        }

        self.apply_modified_properties();

        if !array_like && !composite {
            let event = ValueChanged {
                path,
                previous,
                current: value,
            };
            if let Some(callback) = self.on_value_changed.as_mut() {
                callback(&event);
            }
        }
        Ok(())
    }

    /// Runs a method node and commits whatever it changed.
    ///
    /// Cached values of the method's sibling members are dropped, since the
    /// method may have written any of them. Element counts are not
    /// re-checked; call [`rebuild_all`](Self::rebuild_all) if the method
    /// changes the shape of a container.
    pub fn invoke(&mut self, id: NodeId) -> TreeResult<Value> {
        let node = self.node(id)?;
        if !node.kind.is_method() {
            return Err(TreeError::NotInvocable(node.path.clone()));
        }
        let parent = node.parent;
        let result = self.call_method(id, node)?;
        match parent {
            Some(parent) => self.invalidate_descendants(parent),
            None => {
                for top in self.fields.iter().chain(&self.properties) {
                    if let Some(cell) = self.node(*top).ok().and_then(|n| n.cell.as_ref()) {
                        cell.invalidate();
                    }
                    self.invalidate_descendants(*top);
                }
            }
        }
        self.apply_modified_properties();
        Ok(result)
    }

    fn write_member(&self, node: &TreeProperty, value: Value) -> TreeResult<()> {
        let (declaring, set) = match node.kind {
            NodeKind::Field(f) => (f.declaring, f.info.set),
            NodeKind::Property(p) => (
                p.declaring,
                p.info
                    .set
                    .ok_or_else(|| TreeError::ReadOnly(node.path.clone()))?,
            ),
            _ => return Err(TreeError::NotAssignable(node.path.clone())),
        };
        let owner = self.owner_instance(node)?;
        let mut object = owner.borrow_mut();
        let part = declaring_part_mut(&mut *object, declaring)
            .ok_or_else(|| TreeError::MissingParent(node.path.clone()))?;
        set(part, value)?;
        Ok(())
    }

    /// Writes `value` into the owner of `id`, recursing through enclosing
    /// containers for elements. Returns the outermost node written.
    pub(crate) fn write_node(&self, id: NodeId, value: Value) -> TreeResult<NodeId> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Field(_) | NodeKind::Property(_) => {
                self.write_member(node, value)?;
                Ok(id)
            }
            NodeKind::ArrayElement { index } => {
                let parent_id = node
                    .parent
                    .ok_or_else(|| TreeError::NotElement(node.path.clone()))?;
                let parent = self.node(parent_id)?;
                let handle = parent
                    .array
                    .as_ref()
                    .ok_or_else(|| TreeError::NotArray(parent.path.clone()))?;
                let container = self.get_value_uncached(parent_id)?;
                if container.is_null() {
                    return Err(TreeError::Uninitialized(parent.path.clone()));
                }
                let container = handle
                    .set(container, index, value.clone())
                    .map_err(|err| out_of_range(&parent.path, err))?;
                let last = self.write_node(parent_id, container)?;
                if let Some(cell) = &node.cell {
                    cell.set(value);
                }
                Ok(last)
            }
            NodeKind::Method(_) => Err(TreeError::NotAssignable(node.path.clone())),
        }
    }

    /// Flushes every struct cell above `current` into its owner.
    pub(crate) fn propagate_from(&self, mut current: NodeId) -> TreeResult<()> {
        loop {
            let Some(parent) = self.node(current)?.parent else {
                return Ok(());
            };
            match &self.node(parent)?.cell {
                Some(cell) if cell.holds_struct() => cell.mark_dirty(),
                _ => return Ok(()),
            }
            current = self.flush(parent)?;
        }
    }

    fn flush(&self, id: NodeId) -> TreeResult<NodeId> {
        let node = self.node(id)?;
        let Some(cell) = &node.cell else {
            return Ok(id);
        };
        let Some(value) = cell.get() else {
            return Ok(id);
        };
        let last = self.write_node(id, value)?;
        cell.clear_dirty();
        Ok(last)
    }

    fn invalidate_descendants(&self, id: NodeId) {
        let Ok(node) = self.node(id) else {
            return;
        };
        for child in node
            .children
            .iter()
            .chain(&node.properties)
            .chain(&node.buttons)
        {
            if let Ok(child_node) = self.node(*child) {
                if let Some(cell) = &child_node.cell {
                    cell.invalidate();
                }
            }
            self.invalidate_descendants(*child);
        }
    }

    /// Commits pending edits to the native layer, then applies the parent
    /// root of a nested session.
    ///
    /// A nested session also drops the parent's cached copies below the
    /// shared object, so the next outer write re-reads what this tree
    /// wrote instead of flushing a stale struct back over it.
    ///
    /// The native sequence is always refresh, commit without undo, mark
    /// dirty.
    pub fn apply_modified_properties(&mut self) {
        if let Some(layer) = self.native.as_mut() {
            layer.refresh(&self.target);
            layer.commit_without_undo(&self.target);
            layer.mark_dirty(&self.target);
        }
        if let Some(parent) = &self.parent {
            match parent.try_borrow_mut() {
                Ok(mut parent) => {
                    if let Some(id) = self
                        .parent_path
                        .as_deref()
                        .and_then(|path| parent.find_property(path))
                    {
                        parent.invalidate_descendants(id);
                    }
                    parent.apply_modified_properties();
                }
                Err(_) => log::warn!(
                    "Parent of nested tree '{}' is busy, outer apply skipped",
                    self.info.name
                ),
            }
        }
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    pub fn has_attribute<T: Attribute>(&self, id: NodeId) -> bool {
        self.node(id).is_ok_and(|n| n.attributes.has::<T>())
    }

    pub fn try_get_attribute<T: Attribute>(&self, id: NodeId) -> Option<&'static T> {
        self.node(id).ok()?.attributes.get::<T>()
    }

    pub fn try_get_attributes<T: Attribute>(&self, id: NodeId) -> Vec<&'static T> {
        self.node(id)
            .map(|n| n.attributes.all::<T>())
            .unwrap_or_default()
    }

    /// Type-level attributes of the target.
    pub fn root_attributes(&self) -> Attributes<'static> {
        Attributes::new(&self.info.attributes)
    }

    pub fn root_has_attribute<T: Attribute>(&self) -> bool {
        self.root_attributes().has::<T>()
    }

    pub fn root_try_get_attribute<T: Attribute>(&self) -> Option<&'static T> {
        self.root_attributes().get::<T>()
    }

    pub fn root_try_get_attributes<T: Attribute>(&self) -> Vec<&'static T> {
        self.root_attributes().all::<T>()
    }

    // ---------------------------------------------------------------------
    // Rebuilds
    // ---------------------------------------------------------------------

    /// Queues a rebuild of the children under `path`.
    pub fn schedule_rebuild(&mut self, path: impl Into<String>, reason: RebuildReason) {
        self.rebuilds.push(path, reason);
    }

    pub fn pending_rebuilds(&self) -> &[RebuildRequest] {
        self.rebuilds.pending()
    }

    /// Every rebuild ever requested, including coalesced ones.
    pub fn scheduled_rebuilds(&self) -> u64 {
        self.rebuilds.scheduled_total()
    }

    /// Runs every queued rebuild and notifies the redraw callback once per
    /// processed request. Returns the number processed.
    pub fn process_pending_rebuilds(&mut self) -> usize {
        let mut processed = 0;
        for request in self.rebuilds.drain() {
            let Some(id) = self.find_property(&request.path) else {
                log::debug!("Dropping rebuild of '{}': path is gone", request.path);
                continue;
            };
            log::debug!("Rebuilding '{}' ({:?})", request.path, request.reason);
            if let Err(err) = self.rebuild_children(id) {
                log::warn!("Rebuild of '{}' failed: {err}", request.path);
                continue;
            }
            processed += 1;
            if let Some(redraw) = self.on_redraw.as_mut() {
                redraw();
            }
        }
        processed
    }

    /// Discards and recreates every node below `id`.
    ///
    /// `id` itself stays valid; ids of its former descendants go stale.
    pub fn rebuild_children(&mut self, id: NodeId) -> TreeResult<()> {
        let node = self.node(id)?;
        if let Some(cell) = &node.cell {
            cell.invalidate();
        }
        let old: Vec<NodeId> = node
            .children
            .iter()
            .chain(&node.properties)
            .chain(&node.buttons)
            .copied()
            .collect();
        for child in old {
            self.free_subtree(child);
        }
        let node = self.node_mut(id)?;
        node.children.clear();
        node.properties.clear();
        node.buttons.clear();
        node.expanded_addr = None;

        self.generation += 1;
        let mut ancestors = self.ancestor_addrs(id);
        self.populate(id, &mut ancestors);
        Ok(())
    }

    /// Discards the whole tree and runs discovery again.
    pub fn rebuild_all(&mut self) {
        let top: Vec<NodeId> = self
            .fields
            .drain(..)
            .chain(self.properties.drain(..))
            .chain(self.buttons.drain(..))
            .collect();
        for id in top {
            self.free_subtree(id);
        }
        self.paths.clear();
        self.generation += 1;
        self.build_root();
    }

    pub(crate) fn push_rebuild(&mut self, path: String, reason: RebuildReason) {
        self.rebuilds.push(path, reason);
    }
}

pub(crate) fn out_of_range(path: &str, err: IndexOutOfBounds) -> TreeError {
    TreeError::IndexOutOfRange {
        path: path.to_owned(),
        index: err.index,
        len: err.len,
    }
}

impl fmt::Debug for TreeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeObject")
            .field("target", &self.info.name)
            .field("native", &self.is_native())
            .field("nested", &self.parent.is_some())
            .field("nodes", &self.node_count())
            .field("generation", &self.generation)
            .field("rebuilds", &self.rebuilds)
            .finish()
    }
}
