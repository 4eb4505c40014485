//! Capabilities the host application supplies to the plugin.
//!
//! The plugin never reaches for global editor or window state; every
//! operation receives the handle it needs through one of these traits.

use crate::settings::SettingKey;

/// A named, user-invocable command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub id: &'static str,
    pub name: &'static str,
}

/// Where the plugin registers its commands on activation.
pub trait CommandRegistry {
    fn add_command(&mut self, command: Command);
}

/// The document the command was invoked in.
pub trait Editor {
    /// Zero-based line the cursor is on.
    fn cursor_line(&self) -> usize;

    /// Replace the contents of `line`.
    fn set_line(&mut self, line: usize, text: &str);
}

/// Non-blocking, user-visible messages.
pub trait Notifier {
    fn notice(&self, message: &str);
}

/// Description of one labelled text input in the settings panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSetting {
    /// Field the input edits; passed back to
    /// [`RandomPicPlugin::on_setting_changed`](crate::RandomPicPlugin::on_setting_changed).
    pub key: SettingKey,
    pub name: &'static str,
    pub description: &'static str,
    pub placeholder: &'static str,
    /// Current value to show.
    pub value: String,
}

/// Container the host renders the settings controls into.
pub trait SettingsPanel {
    fn clear(&mut self) {}

    fn heading(&mut self, text: &str);

    fn text_input(&mut self, setting: TextSetting);
}
