//! Deep copies of values, used to duplicate array elements.

use std::collections::HashMap;

use inspector_core::{Instance, TypeInfo, Value, declaring_part, declaring_part_mut};

use crate::discovery::is_serialized;

/// Produces an independent copy of a value graph.
pub trait DeepCopy {
    fn deep_copy(&mut self, value: &Value) -> Value;
}

/// Deep copy through the reflection tables.
///
/// Copies every serialized field (non-serialized ones keep their default,
/// as after a serialization round trip). Shared references are memoized,
/// so two references to one object stay shared in the copy and cycles
/// terminate.
#[derive(Default)]
pub struct ReflectCloner {
    /// Source object address → (source, copy). The source is kept alive so
    /// its address cannot be reused while the memo exists.
    memo: HashMap<usize, (Instance, Instance)>,
}

impl ReflectCloner {
    pub fn new() -> Self {
        Self::default()
    }

    fn copy_object(&mut self, source: &Instance) -> Instance {
        if let Some((_, copy)) = self.memo.get(&source.addr()) {
            return copy.clone();
        }
        let copy = Instance::from_boxed((source.type_info().construct)());
        self.memo
            .insert(source.addr(), (source.clone(), copy.clone()));
        self.copy_fields(source, &copy);
        copy
    }

    fn copy_struct(&mut self, source: &Instance) -> Instance {
        let copy = Instance::from_boxed((source.type_info().construct)());
        self.copy_fields(source, &copy);
        copy
    }

    fn copy_fields(&mut self, source: &Instance, target: &Instance) {
        let mut chain: Vec<&'static TypeInfo> = Vec::new();
        let mut current = Some(source.type_info());
        while let Some(level) = current {
            chain.push(level);
            current = level.base_info();
        }

        for level in chain {
            for field in level.fields.iter().filter(|f| is_serialized(f)) {
                let value = {
                    let object = source.borrow();
                    declaring_part(&*object, level).and_then(|part| (field.get)(part))
                };
                let Some(value) = value else {
                    continue;
                };
                let copied = self.deep_copy(&value);
                let mut object = target.borrow_mut();
                let result = match declaring_part_mut(&mut *object, level) {
                    Some(part) => (field.set)(part, copied),
                    None => continue,
                };
                if let Err(err) = result {
                    log::warn!(
                        "Deep copy of {}.{} failed: {err}",
                        level.name,
                        field.name
                    );
                }
            }
        }
    }
}

impl DeepCopy for ReflectCloner {
    fn deep_copy(&mut self, value: &Value) -> Value {
        match value {
            Value::Struct(instance) => Value::Struct(self.copy_struct(instance)),
            Value::Object(instance) => Value::Object(self.copy_object(instance)),
            Value::List(items) => Value::List(items.iter().map(|v| self.deep_copy(v)).collect()),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.deep_copy(v)).collect()),
            other => other.clone(),
        }
    }
}
