use dashmap::DashMap;

use std::sync::atomic::{AtomicU64, Ordering};

use xdm_core::error::{Result, XdmError};
use xdm_core::value::{Invocation, Method, Value};

/// A local callable exposed to the remote side under a stable id.
#[derive(Clone)]
pub struct ProxyHandle {
    pub id: u64,
    pub method: Method,
}

/// Proxy registry:
/// - `proxy_id -> ProxyHandle`
/// - ids start at 1, strictly increase, and are never reused
pub struct ProxyRegistry {
    proxies: DashMap<u64, ProxyHandle>,
    seq: AtomicU64,
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self {
            proxies: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn register(&self, method: Method) -> u64 {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.proxies.insert(id, ProxyHandle { id, method });
        id
    }

    pub fn get(&self, id: u64) -> Option<ProxyHandle> {
        self.proxies.get(&id).map(|r| r.value().clone())
    }

    /// Look up proxy `id` and invoke it with `args`.
    pub fn resolve(&self, id: u64, args: Vec<Value>) -> Result<Invocation> {
        let handle = self.get(id).ok_or(XdmError::ProxyNotFound(id))?;
        Ok(handle.method.invoke(args))
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let reg = ProxyRegistry::new();
        let ids: Vec<u64> = (0..5)
            .map(|_| reg.register(Method::from_fn(|_| Ok(Value::Null))))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(reg.len(), 5);
    }

    #[tokio::test]
    async fn resolve_invokes_the_registered_callable() {
        let reg = ProxyRegistry::new();
        let id = reg.register(Method::from_fn(|args: Vec<Value>| Ok(Value::Int(args.len() as i64))));

        let out = match reg.resolve(id, vec![Value::Null; 3]) {
            Ok(inv) => inv.resolve().await,
            Err(e) => Err(e),
        };
        assert_eq!(out.ok().and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn unknown_id_is_proxy_not_found() {
        let reg = ProxyRegistry::new();
        reg.register(Method::from_fn(|_| Ok(Value::Null)));
        assert!(matches!(reg.resolve(99, vec![]), Err(XdmError::ProxyNotFound(99))));
    }
}
