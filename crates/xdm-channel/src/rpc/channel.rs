use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value as Json;

use xdm_core::error::{Result, XdmError};
use xdm_core::protocol::{wire, JsonRpcMessage, SerializationSettings};
use xdm_core::value::{ErrorValue, Method, Value};
use xdm_core::{GraphDeserializer, GraphSerializer, ProxyHost};

use crate::cancel::CancelSignal;
use crate::config::ChannelSection;
use crate::dispatch::{Dispatcher, ObjectRegistry};
use crate::rpc::pending::{Outcome, PendingCalls};
use crate::rpc::ProxyRegistry;
use crate::transport::{Inbox, Transport};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// What happened to one inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Response matched a pending call, which is now settled.
    Resolved,
    /// Response for an unknown or already settled call; dropped.
    NoPendingCall,
    /// Response stamped with another channel generation's token; dropped.
    StaleHandshake,
    /// Request for an instance nobody registered; dropped.
    UnknownInstance,
    /// Request handled and a response sent.
    Replied,
}

/// One end of an RPC channel.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    id: u64,
    handshake_token: String,
    cfg: ChannelSection,
    next_message_id: AtomicU64,
    proxies: ProxyRegistry,
    pending: PendingCalls,
    objects: Arc<dyn ObjectRegistry>,
    transport: Arc<dyn Transport>,
    // Handed to remote-function proxies so they do not keep the channel alive.
    this: Weak<ChannelInner>,
}

impl Channel {
    pub fn new(
        cfg: ChannelSection,
        objects: Arc<dyn ObjectRegistry>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let id = cfg
            .channel_id
            .unwrap_or_else(|| NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed));
        let inner = Arc::new_cyclic(|this| ChannelInner {
            id,
            handshake_token: uuid::Uuid::new_v4().to_string(),
            cfg,
            next_message_id: AtomicU64::new(1),
            proxies: ProxyRegistry::new(),
            pending: PendingCalls::new(),
            objects,
            transport,
            this: this.clone(),
        });
        tracing::debug!(channel_id = id, "channel created");
        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn handshake_token(&self) -> &str {
        &self.inner.handshake_token
    }

    pub fn config(&self) -> &ChannelSection {
        &self.inner.cfg
    }

    pub fn object_registry(&self) -> Arc<dyn ObjectRegistry> {
        Arc::clone(&self.inner.objects)
    }

    pub fn proxies(&self) -> &ProxyRegistry {
        &self.inner.proxies
    }

    /// Expose a local callable; returns its proxy id.
    pub fn register_proxy_function(&self, method: Method) -> u64 {
        self.inner.proxies.register(method)
    }

    /// Number of outbound calls still awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// Serializer bound to this channel's proxy registry and depth limit.
    pub fn serializer(&self) -> GraphSerializer<'_> {
        GraphSerializer::new(&*self.inner).with_max_depth(self.inner.cfg.max_depth)
    }

    pub fn deserializer(&self) -> GraphDeserializer<'_> {
        GraphDeserializer::new(&*self.inner).with_max_depth(self.inner.cfg.max_depth)
    }

    /// Call `method_name` on remote instance `instance_id`.
    pub async fn invoke_remote_method(
        &self,
        method_name: &str,
        instance_id: &str,
        args: Vec<Value>,
        instance_context: Option<Json>,
    ) -> Result<Value> {
        self.inner
            .call(instance_id, instance_context, Some(method_name.to_string()), args, None)
            .await
    }

    /// Like [`Channel::invoke_remote_method`], giving up when `cancel` fires.
    pub async fn invoke_remote_method_with(
        &self,
        method_name: &str,
        instance_id: &str,
        args: Vec<Value>,
        instance_context: Option<Json>,
        cancel: &CancelSignal,
    ) -> Result<Value> {
        self.inner
            .call(instance_id, instance_context, Some(method_name.to_string()), args, Some(cancel))
            .await
    }

    /// Fetch the remote registered object itself. Its methods arrive as
    /// callable proxies.
    pub async fn get_remote_object(&self, instance_id: &str, instance_context: Option<Json>) -> Result<Value> {
        self.inner
            .call(instance_id, instance_context, None, Vec::new(), None)
            .await
    }

    /// Handle one inbound envelope.
    ///
    /// Dispatch failures are answered with an error envelope. Only a result
    /// that cannot be encoded (an unclassifiable value) surfaces as `Err`.
    pub async fn handle_envelope(&self, env: JsonRpcMessage) -> Result<Disposition> {
        if env.is_response() {
            return Ok(self.inner.on_response(env));
        }
        self.inner.on_request(env).await
    }

    /// Dispatch loop: handle envelopes from `inbox` until the peer goes away.
    ///
    /// Runs on a single task. Envelopes are handled cooperatively, so a target
    /// method that awaits another call across this channel does not block
    /// correlation of the response it is waiting for.
    pub async fn run(self, mut inbox: Inbox) {
        let channel_id = self.id();
        tracing::info!(channel_id, "channel dispatch loop started");

        let mut inflight = FuturesUnordered::new();
        loop {
            tokio::select! {
                frame = inbox.recv() => match frame {
                    Some(Ok(env)) => {
                        let this = self.clone();
                        inflight.push(async move { this.process(env).await });
                    }
                    Some(Err(e)) => {
                        tracing::warn!(channel_id, error = %e, "dropping malformed envelope");
                    }
                    None => {
                        // Nothing can answer outbound calls now; release
                        // handlers awaiting them before draining.
                        self.inner.pending.close();
                        break;
                    }
                },
                Some(()) = inflight.next(), if !inflight.is_empty() => {}
            }
        }

        while inflight.next().await.is_some() {}
        tracing::info!(channel_id, "channel dispatch loop stopped");
    }

    async fn process(&self, env: JsonRpcMessage) {
        let msg_id = env.id;
        match self.handle_envelope(env).await {
            Ok(disposition) => {
                tracing::debug!(channel_id = self.id(), msg_id, ?disposition, "envelope handled");
            }
            Err(e) => {
                tracing::error!(channel_id = self.id(), msg_id, error = %e, "envelope handling failed");
            }
        }
    }
}

impl ChannelInner {
    async fn call(
        &self,
        instance_id: &str,
        instance_context: Option<Json>,
        method_name: Option<String>,
        args: Vec<Value>,
        cancel: Option<&CancelSignal>,
    ) -> Result<Value> {
        // Allocated before anything can fail so ids are never reused.
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);

        let params = self.serializer().serialize_args(&args)?;
        let settings = SerializationSettings {
            include_underscore_properties: self.cfg.include_underscore_properties,
        };
        let env = JsonRpcMessage::request(
            id,
            instance_id,
            instance_context,
            method_name,
            params,
            self.handshake_token.as_str(),
            Some(settings),
        );

        let rx = self.pending.register(id);
        tracing::debug!(
            channel_id = self.id,
            msg_id = id,
            instance_id,
            method = env.method_name.as_deref().unwrap_or(""),
            "sending request"
        );
        if let Err(e) = self.transport.send_envelope(env).await {
            self.pending.remove(id);
            return Err(e);
        }

        match self.pending.wait(id, rx, self.cfg.call_timeout(), cancel).await? {
            Ok(result) => self.deserializer().deserialize(&result),
            Err(error) => Err(XdmError::Remote(self.decode_error(&error))),
        }
    }

    fn on_response(&self, env: JsonRpcMessage) -> Disposition {
        if self.cfg.validate_handshake && env.handshake_token != self.handshake_token {
            tracing::warn!(channel_id = self.id, msg_id = env.id, "response with foreign handshake token dropped");
            return Disposition::StaleHandshake;
        }

        let outcome: Outcome = match env.error {
            Some(error) => Err(error),
            None => Ok(env.result.unwrap_or(Json::Null)),
        };

        if self.pending.resolve(env.id, outcome) {
            tracing::debug!(channel_id = self.id, msg_id = env.id, "pending call settled");
            Disposition::Resolved
        } else {
            tracing::warn!(channel_id = self.id, msg_id = env.id, "no such pending call");
            Disposition::NoPendingCall
        }
    }

    async fn on_request(&self, env: JsonRpcMessage) -> Result<Disposition> {
        let dispatcher = Dispatcher {
            host: self,
            objects: self.objects.as_ref(),
            proxies: &self.proxies,
            max_depth: self.cfg.max_depth,
            allow_async_methods: self.cfg.allow_async_methods,
        };

        let Some(outcome) = dispatcher.dispatch(&env).await else {
            tracing::warn!(
                channel_id = self.id,
                msg_id = env.id,
                instance_id = env.instance_id.as_deref().unwrap_or(""),
                "request for unknown instance dropped"
            );
            return Ok(Disposition::UnknownInstance);
        };

        let response = match outcome {
            Ok(result) => {
                let node = self
                    .serializer()
                    .with_settings(env.serialization_settings.as_ref())
                    .serialize(&result)?;
                JsonRpcMessage::success(&env, node)
            }
            Err(e) => {
                tracing::warn!(
                    channel_id = self.id,
                    msg_id = env.id,
                    method = env.method_name.as_deref().unwrap_or(""),
                    code = e.code().as_str(),
                    error = %e,
                    "request failed"
                );
                let node = self.serializer().serialize(&Value::from(e.to_error_value()))?;
                JsonRpcMessage::failure(&env, node)
            }
        };

        self.transport.send_envelope(response).await?;
        Ok(Disposition::Replied)
    }

    fn decode_error(&self, error: &Json) -> ErrorValue {
        match self.deserializer().deserialize(error) {
            Ok(Value::Object(obj)) => obj
                .as_exception()
                .unwrap_or_else(|| ErrorValue::new(error.to_string())),
            Ok(Value::String(message)) => ErrorValue::new(message),
            _ => ErrorValue::new(error.to_string()),
        }
    }

    fn serializer(&self) -> GraphSerializer<'_> {
        GraphSerializer::new(self).with_max_depth(self.cfg.max_depth)
    }

    fn deserializer(&self) -> GraphDeserializer<'_> {
        GraphDeserializer::new(self).with_max_depth(self.cfg.max_depth)
    }
}

impl ProxyHost for ChannelInner {
    fn channel_id(&self) -> u64 {
        self.id
    }

    fn register_proxy_function(&self, method: Method) -> u64 {
        self.proxies.register(method)
    }

    fn remote_function(&self, proxy_id: u64, _channel_id: u64) -> Method {
        let this = self.this.clone();
        Method::from_async_fn(move |args| {
            let this = this.clone();
            async move {
                let inner = this.upgrade().ok_or(XdmError::ChannelClosed)?;
                inner
                    .call(&wire::proxy_instance_id(proxy_id), None, None, args, None)
                    .await
            }
        })
    }
}
