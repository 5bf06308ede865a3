//! Host editor traits

use crate::types::{ButtonState, NotifyLevel};

/// The REPL terminal in the panel
pub trait Terminal: Send + Sync {
    /// Write raw text
    fn write(&self, text: &str);

    /// Write a line of text
    fn writeln(&self, text: &str);

    /// Write the REPL prompt
    fn write_prompt(&self);

    /// Start a fresh line
    fn enter(&self);

    /// Clear the terminal contents
    fn clear(&self);
}

/// The panel hosting the terminal and toolbar
pub trait View: Send + Sync {
    /// Show the panel
    fn show(&self);

    /// Hide the panel
    fn hide(&self);

    /// Whether the panel is visible
    fn is_visible(&self) -> bool;

    /// Refresh the toolbar buttons
    fn set_button_state(&self, state: ButtonState);
}

/// Editor integration
pub trait HostApi: Send + Sync {
    /// Name of the project open in this window
    fn project_name(&self) -> String;

    /// Put text on the clipboard
    fn write_clipboard(&self, text: &str);

    /// Open the global settings page
    fn open_settings(&self);

    /// Show a notification
    fn notify(&self, level: NotifyLevel, text: &str);
}
