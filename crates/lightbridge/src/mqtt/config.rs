use serde::Deserialize;

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "lightbridge".to_string()
}

fn default_keep_alive_secs() -> u64 {
    20
}

fn default_clean_session() -> bool {
    true
}

/// Configuration for the MQTT broker connection
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// MQTT broker hostname or IP address
    pub broker: String,

    /// MQTT broker port
    #[serde(default = "default_port")]
    pub port: u16,

    /// MQTT client ID, must be unique on the broker for QoS 1 sessions
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Start with a clean session on connect
    #[serde(default = "default_clean_session")]
    pub clean_session: bool,

    /// Optional username for authentication
    pub username: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,
}
