use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use xdm_core::error::{Result, XdmError};
use xdm_core::protocol::JsonRpcMessage;

use super::{codec, Transport};

/// In-process transport: envelopes are encoded to JSON frames and pushed into
/// the peer's bounded queue.
#[derive(Clone)]
pub struct MpscTransport {
    tx: mpsc::Sender<Bytes>,
}

/// Receiving end of an `MpscTransport`.
pub struct Inbox {
    rx: mpsc::Receiver<Bytes>,
}

impl MpscTransport {
    /// Two connected endpoints. Each transport delivers into the other
    /// endpoint's inbox.
    pub fn pair(capacity: usize) -> ((MpscTransport, Inbox), (MpscTransport, Inbox)) {
        let (a_tx, a_rx) = mpsc::channel(capacity);
        let (b_tx, b_rx) = mpsc::channel(capacity);
        (
            (MpscTransport { tx: b_tx }, Inbox { rx: a_rx }),
            (MpscTransport { tx: a_tx }, Inbox { rx: b_rx }),
        )
    }

    /// A transport and the inbox it delivers into.
    pub fn loopback(capacity: usize) -> (MpscTransport, Inbox) {
        let (tx, rx) = mpsc::channel(capacity);
        (MpscTransport { tx }, Inbox { rx })
    }
}

#[async_trait]
impl Transport for MpscTransport {
    async fn send_envelope(&self, envelope: JsonRpcMessage) -> Result<()> {
        let frame = codec::encode(&envelope)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| XdmError::ChannelClosed)
    }
}

impl Inbox {
    /// Next envelope; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Result<JsonRpcMessage>> {
        let frame = self.rx.recv().await?;
        Some(codec::decode(&frame))
    }
}
