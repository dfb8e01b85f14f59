//! MQTT transport for lightbridge.
//!
//! The dispatcher only sees the [`MqttClient`] trait; [`RumqttcClient`] is the
//! broker-backed implementation used by the daemon.

mod client;
mod config;

pub use client::ClientError;
#[cfg(test)]
pub use client::MockMqttClient;
pub use client::MqttClient;
pub use client::RumqttcClient;
pub use config::Config as MqttConfig;

/// Subscription filter for switch action events published by Zigbee2MQTT
pub const ACTION_SUBSCRIPTION: &str = "zigbee2mqtt/+/action";
