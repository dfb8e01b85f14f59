use serde::Serialize;

/// Topic prefix of the lights controlled through the Lightwave RF MQTT bridge
const COMMAND_TOPIC_PREFIX: &str = "hmd/light/MQTT-Lightwave-RF";

/// On/off state as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

/// Command published to a light, e.g. `{"state": "ON", "brightness": 80}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightCommand {
    pub state: PowerState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i64>,
}

impl LightCommand {
    /// Build the command that moves a light to `on`
    ///
    /// Brightness is only sent when turning on; an OFF command never carries it.
    pub fn new(on: bool, brightness: Option<i64>) -> Self {
        if on {
            Self {
                state: PowerState::On,
                brightness,
            }
        } else {
            Self {
                state: PowerState::Off,
                brightness: None,
            }
        }
    }

    /// Serialize to the JSON payload
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Topic to publish commands for `light_id` on
pub fn command_topic(light_id: &str) -> String {
    format!("{}/{}/command", COMMAND_TOPIC_PREFIX, light_id)
}
