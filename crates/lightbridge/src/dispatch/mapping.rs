use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

/// A configured binding from a switch to the light it toggles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LightMapping {
    /// Zigbee2MQTT friendly name of the switch
    pub switch_id: String,

    /// Light identifier used in the command topic
    pub light_id: String,

    /// Brightness to apply when turning the light on
    pub brightness: Option<i64>,
}

/// Immutable lookup from switch id to its mapping
#[derive(Debug, Default)]
pub struct MappingTable {
    by_switch: HashMap<String, LightMapping>,
}

impl MappingTable {
    /// Build the table from mappings in configuration order
    ///
    /// If a switch id appears more than once the last mapping wins.
    pub fn new(mappings: impl IntoIterator<Item = LightMapping>) -> Self {
        let mut by_switch = HashMap::new();

        for mapping in mappings {
            let light_id = mapping.light_id.clone();
            if let Some(previous) = by_switch.insert(mapping.switch_id.clone(), mapping) {
                warn!(
                    "Duplicate mapping for switch {}: light {} replaced by {}",
                    previous.switch_id, previous.light_id, light_id
                );
            }
        }

        Self { by_switch }
    }

    pub fn lookup(&self, switch_id: &str) -> Option<&LightMapping> {
        self.by_switch.get(switch_id)
    }

    pub fn len(&self) -> usize {
        self.by_switch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_switch.is_empty()
    }
}
