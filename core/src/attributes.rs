//! Marker attributes and attribute queries.
//!
//! Attributes are arbitrary `'static` values attached to types and
//! members in a descriptor table. The core model only looks at the
//! inclusion markers ([`SerializeField`], [`HideInInspector`],
//! [`NonSerialized`], [`ShowInInspector`], [`Button`]). Everything else is
//! for the UI layer, which queries by type through [`Attributes`].
//!
//! Any `Debug + Send + Sync + 'static` type can be used as an attribute:
//!
//! ```ignore
//! #[derive(Debug)]
//! struct Header(&'static str);
//!
//! #[derive(Inspectable, Clone, Default)]
//! struct Settings {
//!     #[inspect(attr = Header("Audio"))]
//!     pub volume: f32,
//! }
//! ```

use std::any::Any;
use std::fmt;

/// A value attached to a type or member descriptor.
///
/// Blanket-implemented for every `Debug + Send + Sync + 'static` type.
pub trait Attribute: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Attribute for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Forces a non-public field to be serialized and inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeField;

/// Hides a field from the inspector even if it is public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HideInInspector;

/// Excludes a field from serialization (and therefore from the inspector).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonSerialized;

/// Includes a property in the inspector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowInInspector;

/// Exposes a zero-argument method as an inspector button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button;

/// Marks a shared-reference field holding a polymorphic payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeReference;

/// The UI layer draws this member or type with a dedicated renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomRenderer;

/// Overrides the derived display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayName(pub &'static str);

/// Hover text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tooltip(pub &'static str);

/// Numeric slider bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Borrowed view over a descriptor's attribute list.
#[derive(Clone, Copy)]
pub struct Attributes<'a>(&'a [Box<dyn Attribute>]);

impl<'a> Attributes<'a> {
    pub const EMPTY: Attributes<'static> = Attributes(&[]);

    pub fn new(list: &'a [Box<dyn Attribute>]) -> Self {
        Self(list)
    }

    pub fn has<T: Attribute>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// First attribute of type `T`.
    pub fn get<T: Attribute>(&self) -> Option<&'a T> {
        self.0.iter().find_map(|a| (**a).as_any().downcast_ref::<T>())
    }

    /// Every attribute of type `T`, in declaration order.
    pub fn all<T: Attribute>(&self) -> Vec<&'a T> {
        self.0
            .iter()
            .filter_map(|a| (**a).as_any().downcast_ref::<T>())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn Attribute> + 'a {
        self.0.iter().map(|a| &**a)
    }
}

impl fmt::Debug for Attributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
