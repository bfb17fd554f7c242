//! xdm loopback demo
//!
//! Two channels joined by an in-process transport:
//! - `host` publishes `calc-1` (sync, async and callback-taking methods)
//! - `guest` calls into it and passes a local closure as a proxy function
//!
//! Usage: `xdm-loopback [config.yaml]` (defaults to `xdm.yaml`).

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use xdm_channel::{config, Channel, ChannelSection, MpscTransport, StaticObjectRegistry};
use xdm_core::error::{Result, XdmError};
use xdm_core::value::{Method, Record, Value};

fn arg_i64(args: &[Value], i: usize) -> Result<i64> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| XdmError::invocation(format!("argument {i} must be an integer")))
}

fn calculator() -> Value {
    let record = Record::new("Calculator")
        .with("name", "calc-1")
        .with(
            "add",
            Method::from_fn(|args| Ok(Value::Int(arg_i64(&args, 0)? + arg_i64(&args, 1)?))),
        )
        .with(
            "slowSquare",
            Method::from_async_fn(|args| async move {
                let n = arg_i64(&args, 0)?;
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Value::Int(n * n))
            }),
        )
        .with(
            "applyTwice",
            Method::from_async_fn(|args| async move {
                let f = args
                    .first()
                    .and_then(Value::as_method)
                    .cloned()
                    .ok_or_else(|| XdmError::invocation("argument 0 must be a function"))?;
                let once = f.call(vec![Value::Int(arg_i64(&args, 1)?)]).await?;
                f.call(vec![once]).await
            }),
        );
    Value::object(record)
}

fn load_config() -> Result<ChannelSection> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    match config::load_from_file(&path) {
        Ok(cfg) => Ok(cfg.channel),
        Err(XdmError::Internal(reason)) => {
            tracing::warn!(%path, %reason, "config not readable, using defaults");
            Ok(ChannelSection::default())
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = load_config()?;
    let ((host_tx, host_inbox), (guest_tx, guest_inbox)) = MpscTransport::pair(cfg.inbox_capacity);

    let objects = Arc::new(StaticObjectRegistry::new());
    objects.register("calc-1", calculator());

    let host = Channel::new(cfg.clone(), objects, Arc::new(host_tx));
    let guest = Channel::new(cfg, Arc::new(StaticObjectRegistry::new()), Arc::new(guest_tx));
    tokio::spawn(host.clone().run(host_inbox));
    tokio::spawn(guest.clone().run(guest_inbox));

    let sum = guest
        .invoke_remote_method("add", "calc-1", vec![Value::Int(2), Value::Int(3)], None)
        .await?;
    tracing::info!(?sum, "add(2, 3)");

    let square = guest
        .invoke_remote_method("slowSquare", "calc-1", vec![Value::Int(7)], None)
        .await?;
    tracing::info!(?square, "slowSquare(7)");

    let double = Method::from_fn(|args| Ok(Value::Int(arg_i64(&args, 0)? * 2)));
    let quad = guest
        .invoke_remote_method("applyTwice", "calc-1", vec![Value::Method(double), Value::Int(5)], None)
        .await?;
    tracing::info!(?quad, "applyTwice(double, 5)");

    match guest.invoke_remote_method("divide", "calc-1", vec![], None).await {
        Err(e) => tracing::info!(error = %e, "divide rejected as expected"),
        Ok(v) => tracing::warn!(?v, "divide unexpectedly succeeded"),
    }

    let remote = guest.get_remote_object("calc-1", None).await?;
    if let Some(add) = remote.get("add").as_ref().and_then(Value::as_method) {
        let via_proxy = add.call(vec![Value::Int(40), Value::Int(2)]).await?;
        tracing::info!(?via_proxy, "remote object add(40, 2)");
    }

    tracing::info!(host = host.id(), guest = guest.id(), "loopback demo finished");
    Ok(())
}
