//! Input event taxonomy delivered to [`crate::client::ViewerClient::handle_input`].
//!
//! All coordinates are viewport pixels with the origin at the top-left corner.

/// Platform key code; the default bindings use DOM `keyCode` values.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct KeyCode(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary pointer pressed at `(x, y)`.
    PointerDown { x: f32, y: f32 },
    KeyPress(KeyCode),
    /// Viewport resized to `width` x `height`.
    Resize { width: u32, height: u32 },
}

/// What a key press was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ToggleView,
    /// Reserved; currently does nothing.
    Cancel,
    Unbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub toggle: KeyCode,
    pub cancel: KeyCode,
}

impl KeyBindings {
    pub fn action(&self, key: KeyCode) -> KeyAction {
        if key == self.toggle {
            KeyAction::ToggleView
        } else if key == self.cancel {
            KeyAction::Cancel
        } else {
            KeyAction::Unbound
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle: KeyCode(84),
            cancel: KeyCode(27),
        }
    }
}
