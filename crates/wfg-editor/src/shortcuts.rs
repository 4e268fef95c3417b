//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Anything the
//! map does not bind is left to the host page.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    /// Remove the selected node or connection.
    Delete,
    Deselect,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    Arrange,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a `KeyboardEvent.key` value under the held modifiers.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        use ShortcutAction::*;

        match (modifiers.cmd(), modifiers.shift) {
            (true, true) => match key {
                "l" | "L" => Some(Arrange),
                "+" => Some(ZoomIn),
                _ => None,
            },
            (true, false) => match key {
                "=" | "+" => Some(ZoomIn),
                "-" => Some(ZoomOut),
                "0" => Some(ZoomToFit),
                _ => None,
            },
            (false, true) => None,
            (false, false) => match key {
                "Delete" | "Backspace" => Some(Delete),
                "Escape" => Some(Deselect),
                _ => None,
            },
        }
    }
}
