use dashmap::DashMap;
use serde_json::Value as Json;

use xdm_core::value::Value;

/// Resolves the target of an inbound request.
pub trait ObjectRegistry: Send + Sync {
    /// `None` when no such object is registered for this context.
    fn get_registered_object(&self, instance_id: &str, instance_context: Option<&Json>) -> Option<Value>;
}

/// Registry of objects published under fixed instance ids (context ignored).
#[derive(Default)]
pub struct StaticObjectRegistry {
    objects: DashMap<String, Value>,
}

impl StaticObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    pub fn register(&self, instance_id: impl Into<String>, object: Value) {
        self.objects.insert(instance_id.into(), object);
    }

    pub fn unregister(&self, instance_id: &str) -> Option<Value> {
        self.objects.remove(instance_id).map(|(_, v)| v)
    }

    pub fn registered_ids(&self) -> Vec<String> {
        self.objects.iter().map(|e| e.key().clone()).collect()
    }
}

impl ObjectRegistry for StaticObjectRegistry {
    fn get_registered_object(&self, instance_id: &str, _instance_context: Option<&Json>) -> Option<Value> {
        self.objects.get(instance_id).map(|r| r.value().clone())
    }
}
