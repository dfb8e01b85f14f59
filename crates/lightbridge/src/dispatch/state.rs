use std::collections::HashMap;

/// Last on/off state lightbridge assigned to each light.
///
/// Lights that have never been toggled are off. Owned by the dispatcher, which
/// is the only reader and writer, so no locking is needed.
#[derive(Debug, Default)]
pub struct ToggleStore {
    lights: HashMap<String, bool>,
}

impl ToggleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the light is currently considered on
    pub fn current_state(&self, light_id: &str) -> bool {
        self.lights.get(light_id).copied().unwrap_or(false)
    }

    /// Flip the light's state, returning `(previous, next)`
    pub fn toggle(&mut self, light_id: &str) -> (bool, bool) {
        let state = self.lights.entry(light_id.to_string()).or_insert(false);
        let previous = *state;
        *state = !previous;
        (previous, *state)
    }
}
