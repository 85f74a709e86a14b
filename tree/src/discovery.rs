//! Member discovery.
//!
//! Walks a type's base chain from the most-base type to the most-derived
//! one and collects the members the inspector shows. Base members come
//! first and declaration order is kept within each level; consumers rely on
//! this order for display.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use inspector_core::{
    Attributes, Button, FieldInfo, HideInInspector, MethodInfo, NonSerialized, PropertyInfo,
    SerializeField, ShowInInspector, TypeInfo, TypeRegistry, Visibility,
};

/// A member together with the type level that declares it.
pub struct MemberRef<M: 'static> {
    pub declaring: &'static TypeInfo,
    pub info: &'static M,
}

impl<M: 'static> Clone for MemberRef<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: 'static> Copy for MemberRef<M> {}

impl<M: 'static> fmt::Debug for MemberRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberRef({})", self.declaring.name)
    }
}

/// Discovered members of one type, base-first.
#[derive(Debug, Default)]
pub struct Members {
    pub fields: Vec<MemberRef<FieldInfo>>,
    pub methods: Vec<MemberRef<MethodInfo>>,
    pub properties: Vec<MemberRef<PropertyInfo>>,
}

/// A field the serializer writes: not `NonSerialized`, and public or `SerializeField`.
pub fn is_serialized(field: &FieldInfo) -> bool {
    let attrs = Attributes::new(&field.attributes);
    if attrs.has::<NonSerialized>() {
        return false;
    }
    field.visibility == Visibility::Public || attrs.has::<SerializeField>()
}

/// A serialized field that is not hidden.
pub fn is_inspected_field(field: &FieldInfo) -> bool {
    is_serialized(field) && !Attributes::new(&field.attributes).has::<HideInInspector>()
}

pub fn is_button(method: &MethodInfo) -> bool {
    Attributes::new(&method.attributes).has::<Button>()
}

pub fn is_shown(property: &PropertyInfo) -> bool {
    Attributes::new(&property.attributes).has::<ShowInInspector>()
}

/// Reusable buffer for the base chain walk.
#[derive(Debug, Default)]
pub struct DiscoveryScratch {
    chain: Vec<&'static TypeInfo>,
}

/// Collects the inspected members of `info`, base levels first.
pub fn discover(info: &'static TypeInfo, scratch: &mut DiscoveryScratch) -> Members {
    scratch.chain.clear();
    let mut current = Some(info);
    while let Some(level) = current {
        scratch.chain.push(level);
        current = level.base_info();
    }

    let mut members = Members::default();
    for &level in scratch.chain.iter().rev() {
        members.fields.extend(
            level
                .fields
                .iter()
                .filter(|f| is_inspected_field(f))
                .map(|info| MemberRef { declaring: level, info }),
        );
        members.methods.extend(
            level
                .methods
                .iter()
                .filter(|m| is_button(m))
                .map(|info| MemberRef { declaring: level, info }),
        );
        members.properties.extend(
            level
                .properties
                .iter()
                .filter(|p| is_shown(p))
                .map(|info| MemberRef { declaring: level, info }),
        );
    }
    members
}

/// Per-type cache of discovery results.
///
/// Every type discovered is also registered in the global [`TypeRegistry`]
/// so type references can name it.
#[derive(Default)]
pub struct Discovery {
    cache: HashMap<usize, Rc<Members>>,
    scratch: DiscoveryScratch,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&mut self, info: &'static TypeInfo) -> Rc<Members> {
        let key = info as *const TypeInfo as usize;
        if let Some(members) = self.cache.get(&key) {
            return Rc::clone(members);
        }
        TypeRegistry::global().register(info);
        let members = Rc::new(discover(info, &mut self.scratch));
        self.cache.insert(key, Rc::clone(&members));
        members
    }

    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }
}

impl fmt::Debug for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discovery")
            .field("cached", &self.cache.len())
            .finish()
    }
}
