use std::collections::HashMap;

use super::hud::pad_button_at;
use super::input::PadStates;
use super::{PadButton, Vec2};

/// Contact id used when the mouse presses a pad button.
pub(crate) const MOUSE_CONTACT_ID: u64 = u64::MAX;

/// Tracks which pad button each active contact started on.
///
/// A contact holds its button until it ends or is cancelled, even if it slides off.
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    contacts: HashMap<u64, PadButton>,
}

impl TouchTracker {
    /// Returns the pad button claimed by this contact, or `None` when it started off the pad.
    pub(crate) fn contact_started(
        &mut self,
        id: u64,
        position_px: Vec2,
        window_size: (u32, u32),
    ) -> Option<PadButton> {
        let button = pad_button_at(window_size, position_px)?;
        self.contacts.insert(id, button);
        Some(button)
    }

    /// Returns true when the contact was holding a pad button.
    pub(crate) fn contact_ended(&mut self, id: u64) -> bool {
        self.contacts.remove(&id).is_some()
    }

    pub(crate) fn is_tracking(&self, id: u64) -> bool {
        self.contacts.contains_key(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.contacts.clear();
    }

    pub(crate) fn pad_states(&self) -> PadStates {
        let mut states = PadStates::default();
        for button in self.contacts.values() {
            states.set(*button, true);
        }
        states
    }
}
