//! MQTT broker client behind [`TransportPort`].
//!
//! The ESP-IDF client hands events to a dedicated `mqtt-rx` thread that
//! pumps the connection and forwards decoded messages into an unbounded
//! channel; the control loop drains that channel via `try_recv`. All
//! device state stays on the loop's side of the seam.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{info, warn};

use crate::app::ports::{InboundMessage, TransportPort};
use crate::error::TransportError;

/// How long to wait for the broker handshake before failing startup.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct MqttTransport {
    client: EspMqttClient<'static>,
    rx: Receiver<InboundMessage>,
}

impl MqttTransport {
    /// Connect, wait for the broker handshake, and subscribe to every
    /// command topic.
    pub fn connect(
        broker_url: &str,
        client_id: &str,
        subscriptions: &[String],
    ) -> anyhow::Result<Self> {
        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            keep_alive_interval: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let (mut client, connection) = EspMqttClient::new(broker_url, &conf)
            .with_context(|| format!("MQTT client setup for {broker_url} failed"))?;

        let (tx, rx) = channel::<InboundMessage>();
        let connected = Arc::new(AtomicBool::new(false));
        spawn_rx_pump(connection, tx, connected.clone())?;

        let mut waited = Duration::ZERO;
        while !connected.load(Ordering::SeqCst) {
            if waited >= CONNECT_TIMEOUT {
                bail!("MQTT broker {broker_url} did not answer within {CONNECT_TIMEOUT:?}");
            }
            thread::sleep(Duration::from_millis(100));
            waited += Duration::from_millis(100);
        }
        info!("MQTT connected to {broker_url} as '{client_id}'");

        for topic in subscriptions {
            client
                .subscribe(topic, QoS::AtLeastOnce)
                .with_context(|| format!("subscribe to {topic} failed"))?;
            info!("subscribed to {topic}");
        }

        Ok(Self { client, rx })
    }
}

/// The connection must be pumped continuously or the client stalls, so
/// the pump gets its own thread for the process lifetime.
fn spawn_rx_pump(
    mut connection: EspMqttConnection,
    tx: Sender<InboundMessage>,
    connected: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("mqtt-rx".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            while let Ok(event) = connection.next() {
                match event.payload() {
                    EventPayload::Connected(_) => connected.store(true, Ordering::SeqCst),
                    EventPayload::Disconnected => {
                        connected.store(false, Ordering::SeqCst);
                        warn!("MQTT disconnected; client will reconnect");
                    }
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        ..
                    } => match core::str::from_utf8(data) {
                        Ok(text) => {
                            let _ = tx.send(InboundMessage {
                                topic: topic.to_string(),
                                payload: text.to_string(),
                            });
                        }
                        Err(_) => warn!("dropping non-UTF8 payload on {topic}"),
                    },
                    _ => {}
                }
            }
            warn!("mqtt-rx pump exited");
        })
        .context("spawning mqtt-rx thread failed")?;
    Ok(())
}

impl TransportPort for MqttTransport {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.client
            .enqueue(topic, QoS::AtLeastOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| TransportError::PublishFailed)
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.rx.try_recv().ok()
    }
}
