use inspector_core::Value;

/// Fired after a successful write to a scalar node. Writes that replace a
/// container, struct or object do not fire it.
#[derive(Debug, Clone)]
pub struct ValueChanged {
    pub path: String,
    /// `None` when the previous value could not be read.
    pub previous: Option<Value>,
    pub current: Value,
}

pub(crate) type RedrawCallback = Box<dyn FnMut()>;
pub(crate) type ValueChangedCallback = Box<dyn FnMut(&ValueChanged)>;
