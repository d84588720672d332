//! `ViewController` – owns the active [`ViewMode`] and keeps exactly one layer shown.

use log::info;

use crate::types::ViewMode;
use crate::world::WorldState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewController {
    current: ViewMode,
}

impl ViewController {
    pub fn new(initial: ViewMode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> ViewMode {
        self.current
    }

    /// Advance to the next mode, rebuild and show its layer, hide the old one.
    ///
    /// Before the world is initialized only the mode changes; `initialize`
    /// shows whichever mode is current at that point.
    pub fn toggle(&mut self, world: &mut WorldState) -> ViewMode {
        let previous = self.current;
        self.current = previous.next();

        if world.is_initialized() {
            // Both calls only fail on an uninitialized world.
            let _ = world.reset_to(self.current);
            let _ = world.hide(previous);
        }

        info!("View: {} -> {}", previous, self.current);
        self.current
    }
}
