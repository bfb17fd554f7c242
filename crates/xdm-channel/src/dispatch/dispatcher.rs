use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use futures_util::FutureExt;

use xdm_core::error::{Result, XdmError};
use xdm_core::protocol::{wire, JsonRpcMessage};
use xdm_core::value::{Invocation, Value};
use xdm_core::{classify, GraphDeserializer, ProxyHost, TypeGroup};

use crate::dispatch::ObjectRegistry;
use crate::rpc::ProxyRegistry;

/// Routes one inbound request to its target and runs it.
///
/// Targets are looked up in the object registry first; an instance id of the
/// form `proxy<N>` that no registered object claims addresses proxy function N.
pub struct Dispatcher<'a> {
    pub host: &'a dyn ProxyHost,
    pub objects: &'a dyn ObjectRegistry,
    pub proxies: &'a ProxyRegistry,
    pub max_depth: usize,
    pub allow_async_methods: bool,
}

impl Dispatcher<'_> {
    /// `None` when the request names no known target; such requests are
    /// dropped rather than answered.
    pub async fn dispatch(&self, env: &JsonRpcMessage) -> Option<Result<Value>> {
        let instance_id = env.instance_id.as_deref()?;

        let Some(target) = self
            .objects
            .get_registered_object(instance_id, env.instance_context.as_ref())
        else {
            let proxy_id = wire::parse_proxy_instance_id(instance_id)?;
            return Some(self.invoke_proxy(proxy_id, env).await);
        };

        match env.method_name.as_deref().filter(|n| !n.trim().is_empty()) {
            // Identity probe: hand back the object itself.
            None => Some(Ok(target)),
            Some(name) => Some(self.invoke_method(&target, name, env).await),
        }
    }

    async fn invoke_method(&self, target: &Value, name: &str, env: &JsonRpcMessage) -> Result<Value> {
        let member = target.get(name).unwrap_or_default();
        let method = match (classify(&member), member) {
            (TypeGroup::Method, Value::Method(m)) => m,
            _ => return Err(XdmError::MethodNotFound(name.to_string())),
        };

        let args = self.decode_args(env)?;
        self.complete(name, || Ok(method.invoke(args))).await
    }

    async fn invoke_proxy(&self, proxy_id: u64, env: &JsonRpcMessage) -> Result<Value> {
        let args = self.decode_args(env)?;
        self.complete(&wire::proxy_instance_id(proxy_id), || self.proxies.resolve(proxy_id, args))
            .await
    }

    fn decode_args(&self, env: &JsonRpcMessage) -> Result<Vec<Value>> {
        GraphDeserializer::new(self.host)
            .with_max_depth(self.max_depth)
            .deserialize_args(env.params.as_deref().unwrap_or_default())
    }

    /// Start the target and await it. A panic inside the target becomes an
    /// invocation error so it is answered like any other failure.
    async fn complete<F>(&self, name: &str, start: F) -> Result<Value>
    where
        F: FnOnce() -> Result<Invocation>,
    {
        let invocation = panic::catch_unwind(AssertUnwindSafe(start))
            .map_err(|payload| panicked(name, payload.as_ref()))??;

        if invocation.is_pending() && !self.allow_async_methods {
            return Err(XdmError::UnsupportedAsyncMethod(name.to_string()));
        }
        AssertUnwindSafe(invocation.resolve())
            .catch_unwind()
            .await
            .map_err(|payload| panicked(name, payload.as_ref()))?
    }
}

fn panicked(name: &str, payload: &(dyn Any + Send)) -> XdmError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::error!(method = name, %detail, "target panicked");
    XdmError::invocation(format!("{name} panicked: {detail}"))
}
