//! Channel-side hooks the serializer needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::XdmError;
use crate::value::{read, write, Method};

/// The channel a graph is being encoded for (or decoded from).
///
/// The serializer registers local functions through it; the deserializer asks
/// it for callables standing in for remote functions.
pub trait ProxyHost: Send + Sync {
    /// Id stamped into every proxy function descriptor.
    fn channel_id(&self) -> u64;

    /// Expose a local callable to the remote side; returns its proxy id.
    fn register_proxy_function(&self, method: Method) -> u64;

    /// Callable that forwards to proxy `proxy_id` on the remote side.
    fn remote_function(&self, proxy_id: u64, channel_id: u64) -> Method;
}

/// Host with no remote side.
///
/// Useful for encoding a graph outside of a live channel (diagnostics,
/// fixtures). Registered functions are kept and can be invoked locally; remote
/// functions fail with `ChannelClosed`.
pub struct DetachedHost {
    channel_id: u64,
    next_proxy_id: AtomicU64,
    proxies: RwLock<Vec<(u64, Method)>>,
}

impl DetachedHost {
    pub fn new(channel_id: u64) -> Self {
        Self {
            channel_id,
            next_proxy_id: AtomicU64::new(1),
            proxies: RwLock::new(Vec::new()),
        }
    }

    /// Number of functions registered so far.
    pub fn registered(&self) -> usize {
        read(&self.proxies).len()
    }

    pub fn proxy(&self, proxy_id: u64) -> Option<Method> {
        read(&self.proxies)
            .iter()
            .find(|(id, _)| *id == proxy_id)
            .map(|(_, m)| m.clone())
    }
}

impl ProxyHost for DetachedHost {
    fn channel_id(&self) -> u64 {
        self.channel_id
    }

    fn register_proxy_function(&self, method: Method) -> u64 {
        let id = self.next_proxy_id.fetch_add(1, Ordering::Relaxed);
        write(&self.proxies).push((id, method));
        id
    }

    fn remote_function(&self, _proxy_id: u64, _channel_id: u64) -> Method {
        Method::from_fn(|_| Err(XdmError::ChannelClosed))
    }
}
