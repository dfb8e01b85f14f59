use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::command::LightCommand;
use super::command::command_topic;
use super::event::EventReceiver;
use super::event::InboundEvent;
use super::event::SwitchAction;
use super::mapping::MappingTable;
use super::state::ToggleStore;
use super::topic::parse_action_topic;
use crate::mqtt::ClientError;
use crate::mqtt::MqttClient;

/// lightbridge dispatcher
///
/// Consumes switch action events one at a time, toggles the mapped light and
/// publishes the resulting command. The dispatcher owns the toggle state; it is
/// never shared, so events must all flow through a single instance.
pub struct Dispatcher<C: MqttClient> {
    mappings: MappingTable,
    toggles: ToggleStore,
    client: C,
}

/// What happened to a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A command was published
    Published { topic: String, command: LightCommand },

    /// The event was logged and discarded
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Topic is not `zigbee2mqtt/<switch>/action`
    UnknownTopic(String),

    /// No mapping for the switch
    UnknownSwitch(String),

    /// Gesture other than a single press
    UnknownAction { switch_id: String, action: String },
}

/// Failures that stop the dispatcher unless shutdown is already under way
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to serialize command for light {light_id}: {source}")]
    Serialize {
        light_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to publish to {topic}: {source}")]
    Publish {
        topic: String,
        #[source]
        source: ClientError,
    },
}

impl<C: MqttClient> Dispatcher<C> {
    pub fn new(mappings: MappingTable, client: C) -> Self {
        Self {
            mappings,
            toggles: ToggleStore::new(),
            client,
        }
    }

    pub fn toggles(&self) -> &ToggleStore {
        &self.toggles
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Run the dispatcher until shutdown is signalled or the queue closes
    ///
    /// Shutdown is checked before every dequeue, and an event still being
    /// handled when it is signalled is abandoned. A fatal error raises the
    /// shutdown signal for the rest of the process and is returned to the
    /// caller, except when it happens after shutdown was already signalled: the
    /// in-flight publish losing the race with cancellation is expected.
    pub async fn run(
        &mut self,
        mut events: EventReceiver,
        shutdown: &watch::Sender<bool>,
    ) -> Result<(), DispatchError> {
        info!("Dispatcher running with {} mappings", self.mappings.len());
        let mut signal = shutdown.subscribe();

        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown_requested(&mut signal) => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("Event queue closed");
                        break;
                    }
                },
            };

            let result = tokio::select! {
                result = self.handle_event(event) => result,
                _ = shutdown_requested(&mut signal) => break,
            };

            if let Err(e) = result {
                if *signal.borrow() {
                    debug!("Ignoring error during shutdown: {}", e);
                    break;
                }
                error!("{}", e);
                shutdown.send_replace(true);
                return Err(e);
            }
        }

        info!("Shutting down");
        Ok(())
    }

    /// Handle one inbound event
    pub async fn handle_event(&mut self, event: InboundEvent) -> Result<Outcome, DispatchError> {
        debug!(
            "[mqtt] {} -> {}",
            event.topic,
            String::from_utf8_lossy(&event.payload)
        );

        let Some(switch_id) = parse_action_topic(&event.topic) else {
            warn!("Unknown topic: {}", event.topic);
            return Ok(Outcome::Ignored(IgnoreReason::UnknownTopic(
                event.topic.clone(),
            )));
        };

        let Some(mapping) = self.mappings.lookup(switch_id) else {
            warn!("Unknown switch: {}", switch_id);
            return Ok(Outcome::Ignored(IgnoreReason::UnknownSwitch(
                switch_id.to_string(),
            )));
        };

        let Some(action) = SwitchAction::from_payload(&event.payload) else {
            let action = String::from_utf8_lossy(&event.payload).into_owned();
            warn!("Unknown action from switch {}: {:?}", switch_id, action);
            return Ok(Outcome::Ignored(IgnoreReason::UnknownAction {
                switch_id: switch_id.to_string(),
                action,
            }));
        };

        match action {
            SwitchAction::Single => {
                let (_, next) = self.toggles.toggle(&mapping.light_id);
                let command = LightCommand::new(next, mapping.brightness);
                let payload = command
                    .to_payload()
                    .map_err(|source| DispatchError::Serialize {
                        light_id: mapping.light_id.clone(),
                        source,
                    })?;

                let topic = command_topic(&mapping.light_id);
                if let Err(source) = self.client.publish(&topic, &payload, false).await {
                    return Err(DispatchError::Publish { topic, source });
                }

                info!(
                    "Switch {} turned light {} {:?}",
                    switch_id, mapping.light_id, command.state
                );
                Ok(Outcome::Published { topic, command })
            }
        }
    }
}

/// Resolve once shutdown has been signalled
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // The sender outlives `run`, so the channel cannot close while waiting
    let _ = shutdown.wait_for(|stop| *stop).await;
}
