use winit::keyboard::{KeyCode, PhysicalKey};

/// Held keyboard directions. Enter and Escape are edge-only and live on the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

/// Buttons of the on-screen directional pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    Up,
    Down,
    Left,
    Right,
}

const DIRECTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; DIRECTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PadStates {
    down: [bool; DIRECTION_COUNT],
}

impl PadStates {
    pub(crate) fn set(&mut self, button: PadButton, is_down: bool) {
        self.down[button.index()] = is_down;
    }

    pub(crate) fn is_down(&self, button: PadButton) -> bool {
        self.down[button.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
        }
    }
}

impl PadButton {
    pub const ALL: [PadButton; DIRECTION_COUNT] = [
        PadButton::Up,
        PadButton::Down,
        PadButton::Left,
        PadButton::Right,
    ];

    /// Position of this button in [`PadButton::ALL`].
    pub const fn index(self) -> usize {
        match self {
            PadButton::Up => 0,
            PadButton::Down => 1,
            PadButton::Left => 2,
            PadButton::Right => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PadButton::Up => "^",
            PadButton::Down => "v",
            PadButton::Left => "<",
            PadButton::Right => ">",
        }
    }
}

pub(crate) fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    match key {
        PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
            Some(InputAction::MoveUp)
        }
        PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
            Some(InputAction::MoveDown)
        }
        PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
            Some(InputAction::MoveLeft)
        }
        PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
            Some(InputAction::MoveRight)
        }
        _ => None,
    }
}

pub(crate) fn is_interact_key(key: PhysicalKey) -> bool {
    matches!(
        key,
        PhysicalKey::Code(KeyCode::Enter) | PhysicalKey::Code(KeyCode::NumpadEnter)
    )
}

pub(crate) fn is_dismiss_key(key: PhysicalKey) -> bool {
    matches!(key, PhysicalKey::Code(KeyCode::Escape))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_share_actions() {
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyW)),
            Some(InputAction::MoveUp)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::ArrowUp)),
            Some(InputAction::MoveUp)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::KeyA)),
            Some(InputAction::MoveLeft)
        );
        assert_eq!(
            action_for_key(PhysicalKey::Code(KeyCode::ArrowRight)),
            Some(InputAction::MoveRight)
        );
        assert_eq!(action_for_key(PhysicalKey::Code(KeyCode::KeyQ)), None);
    }

    #[test]
    fn enter_and_escape_are_not_movement() {
        let enter = PhysicalKey::Code(KeyCode::Enter);
        let escape = PhysicalKey::Code(KeyCode::Escape);
        assert!(is_interact_key(enter));
        assert!(is_dismiss_key(escape));
        assert_eq!(action_for_key(enter), None);
        assert_eq!(action_for_key(escape), None);
    }

    #[test]
    fn pad_states_track_each_button_independently() {
        let mut pad = PadStates::default();
        pad.set(PadButton::Left, true);
        assert!(pad.is_down(PadButton::Left));
        assert!(!pad.is_down(PadButton::Right));
        pad.set(PadButton::Left, false);
        assert_eq!(pad, PadStates::default());
    }
}
