//! Process-wide lookup of type descriptors by name.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::reflect::Inspectable;
use crate::type_info::TypeInfo;

#[derive(Default)]
struct Entries {
    /// Fully qualified path → descriptor, ordered for stable enumeration.
    by_path: BTreeMap<&'static str, &'static TypeInfo>,
    /// Short name → every descriptor with that name.
    by_name: HashMap<&'static str, Vec<&'static TypeInfo>>,
}

/// Registry of inspectable types.
///
/// Type references (`TypeRef` members) are assigned from type names, so
/// every type that can be named needs to be registered. Member discovery
/// registers the types it walks automatically. Anything else is registered
/// with [`register`](Self::register).
pub struct TypeRegistry {
    entries: RwLock<Entries>,
}

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }

    /// The shared registry used by coercion.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Registers a descriptor along with its base chain.
    ///
    /// Registering the same descriptor twice is a no-op.
    pub fn register(&self, info: &'static TypeInfo) {
        let mut entries = self.entries.write();
        let mut current = Some(info);
        while let Some(info) = current {
            if entries.by_path.insert(info.type_path, info).is_none() {
                entries.by_name.entry(info.name).or_default().push(info);
            }
            current = info.base_info();
        }
    }

    pub fn register_type<T: Inspectable>(&self) {
        self.register(T::static_type_info());
    }

    /// Resolves a fully qualified path, or a short name when it is unambiguous.
    pub fn resolve(&self, name: &str) -> Option<&'static TypeInfo> {
        let entries = self.entries.read();
        if let Some(info) = entries.by_path.get(name) {
            return Some(*info);
        }
        match entries.by_name.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    pub fn contains(&self, info: &'static TypeInfo) -> bool {
        self.entries
            .read()
            .by_path
            .get(info.type_path)
            .is_some_and(|found| std::ptr::eq(*found, info))
    }

    /// All registered descriptors, ordered by type path.
    pub fn types(&self) -> Vec<&'static TypeInfo> {
        self.entries.read().by_path.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
