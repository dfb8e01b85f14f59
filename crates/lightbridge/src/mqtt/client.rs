use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::AsyncClient;
use rumqttc::Event;
use rumqttc::MqttOptions;
use rumqttc::Outgoing;
use rumqttc::Packet;
use rumqttc::QoS;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ACTION_SUBSCRIPTION;
use super::MqttConfig;
use crate::dispatch::EventSender;
use crate::dispatch::InboundEvent;
use crate::dispatch::offer_event;

/// Error returned by transport operations
pub type ClientError = Box<dyn Error + Send + Sync>;

/// Trait for the MQTT operations the dispatcher needs
///
/// This trait allows for mocking the MQTT client for testing purposes
#[async_trait]
pub trait MqttClient: Send {
    /// Publish a message at QoS 1 (at least once)
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), ClientError>;

    /// Disconnect from the broker
    async fn disconnect(&mut self) -> Result<(), ClientError>;
}

/// Mock MQTT client for testing
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockMqttClient {
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Fail every publish with this message
    pub fail_publish: Option<String>,
    /// Signal shutdown from inside publish, as a SIGTERM arriving mid-publish would
    pub shutdown_on_publish: Option<std::sync::Arc<tokio::sync::watch::Sender<bool>>>,
}

#[cfg(test)]
#[async_trait]
impl MqttClient for MockMqttClient {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), ClientError> {
        if let Some(shutdown) = &self.shutdown_on_publish {
            let _ = shutdown.send(true);
        }
        if let Some(msg) = &self.fail_publish {
            return Err(msg.clone().into());
        }
        self.published
            .push((topic.to_string(), payload.to_vec(), retain));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Real MQTT client implementation using rumqttc
pub struct RumqttcClient {
    /// MQTT connection options (stored for lazy initialization)
    mqtt_options: MqttOptions,

    /// AsyncClient (created in connect())
    client: Option<AsyncClient>,

    /// Background event loop task handle
    event_loop_task: Option<JoinHandle<()>>,
}

impl RumqttcClient {
    /// Create a new RumqttcClient from configuration
    pub fn new(config: &MqttConfig) -> Self {
        let mut mqtt_options =
            MqttOptions::new(config.client_id.clone(), config.broker.clone(), config.port);

        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        mqtt_options.set_clean_session(config.clean_session);

        // Set credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(username, password);
        }

        Self {
            mqtt_options,
            client: None,
            event_loop_task: None,
        }
    }

    /// Start the connection and forward switch action messages into `events`
    ///
    /// The event loop reconnects on its own after errors and re-subscribes on
    /// every ConnAck, so the subscription survives broker restarts. Incoming
    /// messages are offered to the dispatcher queue without waiting; when the
    /// queue is full the message is dropped, so the loop keeps draining the
    /// outgoing publishes the dispatcher is blocked on. The loop ends once the
    /// DISCONNECT sent by [`RumqttcClient::close`] has gone out.
    pub fn connect(&mut self, events: EventSender) {
        let (client, mut event_loop) = AsyncClient::new(self.mqtt_options.clone(), 10);
        let subscriber = client.clone();

        let task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connection up");
                        // try_subscribe: the request channel is drained by this very loop
                        match subscriber.try_subscribe(ACTION_SUBSCRIPTION, QoS::AtLeastOnce) {
                            Ok(()) => info!("Subscribed to {}", ACTION_SUBSCRIPTION),
                            Err(e) => warn!(
                                "Failed to subscribe to {}, no switch events will arrive: {}",
                                ACTION_SUBSCRIPTION, e
                            ),
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let event = InboundEvent {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };

                        if !offer_event(&events, event) {
                            debug!("Dispatcher stopped, discarding message");
                        }
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("Broker requested disconnect");
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        info!("Disconnected from MQTT broker");
                        break;
                    }
                    Ok(_) => {
                        // Ignore other events (suback, puback, pings, etc.)
                    }
                    Err(e) => {
                        warn!("MQTT event loop error: {}", e);
                        // Sleep briefly before reconnecting
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
            debug!("MQTT event loop task exiting");
        });

        self.client = Some(client);
        self.event_loop_task = Some(task);
    }

    /// Disconnect and wait up to `timeout` for the event loop to send the
    /// DISCONNECT and exit; the task is aborted if it does not
    pub async fn close(&mut self, timeout: Duration) -> Result<(), ClientError> {
        self.disconnect().await?;

        if let Some(mut task) = self.event_loop_task.take() {
            if tokio::time::timeout(timeout, &mut task).await.is_err() {
                warn!("MQTT event loop did not stop within {:?}, aborting", timeout);
                task.abort();
            }
        }

        Ok(())
    }

    fn connected_client(&self) -> Result<&AsyncClient, ClientError> {
        self.client.as_ref().ok_or_else(|| -> ClientError {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "MQTT client not connected. Call connect() first.",
            ))
        })
    }
}

#[async_trait]
impl MqttClient for RumqttcClient {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), ClientError> {
        self.connected_client()?
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await?;

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.connected_client()?.disconnect().await?;
        Ok(())
    }
}

impl Drop for RumqttcClient {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop_task.take() {
            task.abort();
        }
    }
}
