/// Root of the Zigbee2MQTT topic tree
const ZIGBEE2MQTT_PREFIX: &str = "zigbee2mqtt";

/// Last segment of a switch action topic
const ACTION_SUFFIX: &str = "action";

/// Parse a switch action topic to extract the switch id
///
/// Topic format: zigbee2mqtt/{switch_id}/action
/// Example: zigbee2mqtt/hall_switch/action
///
/// Returns None unless the topic has exactly three segments, the literal first
/// and last segments match, and the switch id is non-empty.
pub fn parse_action_topic(topic: &str) -> Option<&str> {
    let mut parts = topic.split('/');

    let prefix = parts.next()?;
    let switch_id = parts.next()?;
    let suffix = parts.next()?;

    if parts.next().is_some()
        || prefix != ZIGBEE2MQTT_PREFIX
        || suffix != ACTION_SUFFIX
        || switch_id.is_empty()
    {
        return None;
    }

    Some(switch_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_topic() {
        assert_eq!(parse_action_topic("zigbee2mqtt/sw1/action"), Some("sw1"));
        assert_eq!(
            parse_action_topic("zigbee2mqtt/0x00124b001234abcd/action"),
            Some("0x00124b001234abcd")
        );
        assert_eq!(
            parse_action_topic("zigbee2mqtt/Hall Switch/action"),
            Some("Hall Switch")
        );
    }

    #[test]
    fn test_parse_action_topic_missing_segment() {
        assert_eq!(parse_action_topic("zigbee2mqtt/action"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt//action"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt"), None);
        assert_eq!(parse_action_topic(""), None);
    }

    #[test]
    fn test_parse_action_topic_extra_segment() {
        assert_eq!(parse_action_topic("zigbee2mqtt/sw1/action/extra"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt/sw1/action/"), None);
        assert_eq!(parse_action_topic("/zigbee2mqtt/sw1/action"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt/a/b/action"), None);
    }

    #[test]
    fn test_parse_action_topic_literals() {
        assert_eq!(parse_action_topic("Zigbee2MQTT/sw1/action"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt/sw1/Action"), None);
        assert_eq!(parse_action_topic("zigbee2mqtt/sw1/state"), None);
        assert_eq!(parse_action_topic("other/sw1/action"), None);
    }
}
