//! Variable storage.
//!
//! Storage is authoritative: once a variable has been written, its stored
//! value shadows the program's initial value for that name. The machine
//! shares storage as `Arc<dyn VariableStorage>`, so embedders may read and
//! write variables from other threads while a run is in progress;
//! implementations must synchronize internally.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// Storage for dialogue variables.
pub trait VariableStorage: Send + Sync {
    /// Fetches a value, or `None` if the variable has never been set.
    fn get_value(&self, name: &str) -> Option<Value>;

    /// Sets a value.
    fn set_value(&self, name: &str, value: Value);

    /// Removes all stored values.
    fn clear(&self);
}

/// In-memory [`VariableStorage`] over a read-write-locked map.
#[derive(Default)]
pub struct MemoryVariableStorage {
    values: RwLock<FxHashMap<String, Value>>,
}

impl MemoryVariableStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones the entire contents, e.g. for saving game state.
    pub fn snapshot(&self) -> FxHashMap<String, Value> {
        self.values.read().clone()
    }
}

impl VariableStorage for MemoryVariableStorage {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    fn set_value(&self, name: &str, value: Value) {
        self.values.write().insert(name.to_string(), value);
    }

    fn clear(&self) {
        self.values.write().clear();
    }
}
