//! The editor-facing plugin shell.
//!
//! [`RandomPicPlugin`] owns the settings record and an [`ImageSource`]. The
//! host calls [`RandomPicPlugin::on_load`] once, routes command triggers to
//! [`RandomPicPlugin::run_command`], renders the settings panel through
//! [`RandomPicPlugin::display_settings`] and forwards each edit to
//! [`RandomPicPlugin::on_setting_changed`].

use std::{future::Future, pin::Pin, sync::Arc};

use crate::{
    errors::{Result, SettingsError},
    host::{Command, CommandRegistry, Editor, Notifier, SettingsPanel, TextSetting},
    settings::{SettingKey, Settings, SettingsStore},
    types::FetchedImage,
};

/// Id of the insert command.
pub const COMMAND_INSERT_PICTURE: &str = "insert-random-picture";

/// Display name of the insert command.
pub const COMMAND_INSERT_PICTURE_NAME: &str = "Insert picture";

pub(crate) const MISSING_KEY_NOTICE: &str = "Unsplash Access Key is not set!";

const SETTINGS_HEADING: &str = "Unsplash Plugin Settings";

/// A boxed future type for object-safe async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can produce a random photo.
///
/// [`Client`](crate::Client) is the production implementation.
pub trait ImageSource: Send + Sync {
    fn fetch_random<'a>(
        &'a self,
        access_key: &'a str,
        query: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FetchedImage>>;
}

/// Terminal state of one insert invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// `text` replaced the contents of `line`.
    Inserted { line: usize, text: String },
    /// No access key configured; nothing was fetched.
    MissingAccessKey,
    /// The fetch failed; the document was not touched.
    Failed { message: String },
}

pub struct RandomPicPlugin {
    settings: Settings,
    store: Arc<dyn SettingsStore>,
    source: Arc<dyn ImageSource>,
}

impl RandomPicPlugin {
    /// Activate the plugin: merge the stored record over the defaults.
    pub fn load(
        store: Arc<dyn SettingsStore>,
        source: Arc<dyn ImageSource>,
    ) -> Result<Self, SettingsError> {
        let settings = Settings::merged(store.load()?)?;
        Ok(Self {
            settings,
            store,
            source,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register the plugin's commands with the host.
    pub fn on_load(&self, registry: &mut dyn CommandRegistry) {
        registry.add_command(Command {
            id: COMMAND_INSERT_PICTURE,
            name: COMMAND_INSERT_PICTURE_NAME,
        });
    }

    /// Dispatch a host trigger. Returns `None` for ids this plugin does not own.
    pub async fn run_command(
        &self,
        id: &str,
        editor: &mut dyn Editor,
        notices: &dyn Notifier,
    ) -> Option<InsertOutcome> {
        match id {
            COMMAND_INSERT_PICTURE => Some(self.insert_picture(editor, notices).await),
            _ => None,
        }
    }

    /// Fetch a random photo and write its markdown link over the cursor line.
    ///
    /// Never fails: every error ends as a notice and an [`InsertOutcome`].
    pub async fn insert_picture(
        &self,
        editor: &mut dyn Editor,
        notices: &dyn Notifier,
    ) -> InsertOutcome {
        let access_key = self.settings.access_key.clone();
        if access_key.is_empty() {
            notices.notice(MISSING_KEY_NOTICE);
            return InsertOutcome::MissingAccessKey;
        }
        let query = Some(self.settings.query.clone()).filter(|q| !q.is_empty());

        match self
            .source
            .fetch_random(&access_key, query.as_deref())
            .await
        {
            Ok(image) => {
                let line = editor.cursor_line();
                let text = image.markdown();
                editor.set_line(line, &text);
                #[cfg(feature = "tracing")]
                tracing::debug!(line, url = %image.url, "inserted random photo");
                InsertOutcome::Inserted { line, text }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %err, "failed to fetch random photo");
                let message = format!("Error: {err}");
                notices.notice(&message);
                InsertOutcome::Failed { message }
            }
        }
    }

    /// Render the two settings inputs.
    pub fn display_settings(&self, panel: &mut dyn SettingsPanel) {
        panel.clear();
        panel.heading(SETTINGS_HEADING);
        panel.text_input(TextSetting {
            key: SettingKey::AccessKey,
            name: "Unsplash Access Key",
            description: "Enter your Unsplash API Access Key",
            placeholder: "Enter API Key",
            value: self.settings.access_key.clone(),
        });
        panel.text_input(TextSetting {
            key: SettingKey::Query,
            name: "Default query",
            description: "Enter a default query to search for",
            placeholder: "Enter a default query",
            value: self.settings.query.clone(),
        });
    }

    /// Apply one edit and persist the whole record.
    ///
    /// The in-memory value is updated even when saving fails.
    pub fn on_setting_changed(
        &mut self,
        key: SettingKey,
        value: impl Into<String>,
    ) -> Result<(), SettingsError> {
        self.settings.set(key, value);
        self.save_settings()
    }

    pub fn save_settings(&self) -> Result<(), SettingsError> {
        self.store.save(&self.settings.to_value()?)
    }
}
