//! Socket transports.
//!
//! [`SocketChannel`] is what the [`SocketController`](crate::socket::SocketController)
//! talks to. Two implementations:
//!
//! - [`LocalBus`] – in-process hub, one [`LocalEndpoint`] per client.
//! - [`NatsChannel`] – `async-nats` subject (feature `server`).
//!
//! Both move encoded JSON bytes, so the wire codec is exercised either way.

use crate::error::{Result, TripwireError};
use crate::protocol::SocketEnvelope;
use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub type EnvelopeReceiver = mpsc::UnboundedReceiver<SocketEnvelope>;

#[async_trait]
pub trait SocketChannel: Send + Sync {
    /// Send to every peer on the channel (including, possibly, ourselves).
    async fn emit(&self, envelope: &SocketEnvelope) -> Result<()>;

    /// Open a subscription; decoded envelopes arrive in order.
    async fn listen(&self) -> Result<EnvelopeReceiver>;

    /// Drop every subscription opened through this channel.
    async fn close(&self);
}

/// Forwarder tasks owned by a channel, aborted on close.
#[derive(Default)]
struct Forwarders(Mutex<Vec<JoinHandle<()>>>);

impl Forwarders {
    fn push(&self, handle: JoinHandle<()>) {
        self.0.lock().push(handle);
    }

    fn abort_all(&self) {
        for handle in self.0.lock().drain(..) {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// LocalBus
// ---------------------------------------------------------------------------

/// In-process broadcast hub standing in for the host's socket server.
#[derive(Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<Vec<u8>>,
}

impl LocalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// A new client connection to the hub.
    pub fn endpoint(&self) -> LocalEndpoint {
        LocalEndpoint {
            tx: self.tx.clone(),
            connected: Arc::new(AtomicBool::new(true)),
            forwarders: Forwarders::default(),
        }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LocalEndpoint {
    tx: broadcast::Sender<Vec<u8>>,
    connected: Arc<AtomicBool>,
    forwarders: Forwarders,
}

impl LocalEndpoint {
    /// Simulate a dropped / restored connection. While disconnected, emits
    /// fail and inbound messages are lost.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl SocketChannel for LocalEndpoint {
    async fn emit(&self, envelope: &SocketEnvelope) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TripwireError::Channel("endpoint disconnected".into()));
        }
        let bytes = envelope.encode()?;
        self.tx
            .send(bytes)
            .map(|_| ())
            .map_err(|_| TripwireError::Channel("no peers listening".into()))
    }

    async fn listen(&self) -> Result<EnvelopeReceiver> {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let connected = self.connected.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(bytes) => {
                        if !connected.load(Ordering::SeqCst) {
                            continue;
                        }
                        match SocketEnvelope::decode(&bytes) {
                            Ok(envelope) => {
                                if out_tx.send(envelope).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping undecodable socket message: {}", e),
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Local socket lagged, {} messages lost", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Local socket forwarder exiting");
        });
        self.forwarders.push(handle);
        Ok(out_rx)
    }

    async fn close(&self) {
        self.forwarders.abort_all();
    }
}

// ---------------------------------------------------------------------------
// NATS
// ---------------------------------------------------------------------------

#[cfg(feature = "server")]
pub use nats::NatsChannel;

#[cfg(feature = "server")]
mod nats {
    use super::*;
    use bytes::Bytes;
    use futures::StreamExt;

    /// Socket channel carried on a NATS subject.
    pub struct NatsChannel {
        client: async_nats::Client,
        subject: String,
        forwarders: Forwarders,
    }

    impl NatsChannel {
        pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
            Self {
                client,
                subject: subject.into(),
                forwarders: Forwarders::default(),
            }
        }

        pub async fn connect(endpoint: &str, subject: impl Into<String>) -> Result<Self> {
            let client = async_nats::connect(endpoint)
                .await
                .map_err(|e| TripwireError::Channel(format!("NATS connect failed: {}", e)))?;
            Ok(Self::new(client, subject))
        }
    }

    #[async_trait]
    impl SocketChannel for NatsChannel {
        async fn emit(&self, envelope: &SocketEnvelope) -> Result<()> {
            let payload = envelope.encode()?;
            self.client
                .publish(self.subject.clone(), Bytes::from(payload))
                .await
                .map_err(|e| TripwireError::Channel(format!("publish to {}: {}", self.subject, e)))
        }

        async fn listen(&self) -> Result<EnvelopeReceiver> {
            let mut sub = self
                .client
                .subscribe(self.subject.clone())
                .await
                .map_err(|e| TripwireError::Channel(format!("subscribe {}: {}", self.subject, e)))?;
            let (out_tx, out_rx) = mpsc::unbounded_channel();
            let subject = self.subject.clone();

            let handle = tokio::spawn(async move {
                while let Some(msg) = sub.next().await {
                    match SocketEnvelope::decode(&msg.payload) {
                        Ok(envelope) => {
                            if out_tx.send(envelope).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping undecodable message on {}: {}", subject, e),
                    }
                }
                debug!("NATS subscription on {} ended", subject);
            });
            self.forwarders.push(handle);
            Ok(out_rx)
        }

        async fn close(&self) {
            self.forwarders.abort_all();
        }
    }
}
