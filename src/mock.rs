//! In-memory stand-ins for the image API and the host, for offline tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{
    errors::{Error, Result, ValidationError},
    host::{Command, CommandRegistry, Editor, Notifier, SettingsPanel, TextSetting},
    plugin::{BoxFuture, ImageSource},
    types::FetchedImage,
};

/// Image source that replays queued results and records every call.
#[derive(Clone, Default)]
pub struct MockImageSource {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    results: Mutex<VecDeque<Result<FetchedImage>>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, image: FetchedImage) -> Self {
        self.push(Ok(image));
        self
    }

    pub fn with_error(self, err: Error) -> Self {
        self.push(Err(err));
        self
    }

    pub fn push(&self, result: Result<FetchedImage>) {
        self.inner
            .results
            .lock()
            .expect("lock poisoned")
            .push_back(result);
    }

    /// `(access_key, query)` of every fetch, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.inner.calls.lock().expect("lock poisoned").clone()
    }

    fn next(&self) -> Result<FetchedImage> {
        self.inner
            .results
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Validation(ValidationError::new("no mock image queued"))))
    }
}

impl ImageSource for MockImageSource {
    fn fetch_random<'a>(
        &'a self,
        access_key: &'a str,
        query: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FetchedImage>> {
        self.inner
            .calls
            .lock()
            .expect("lock poisoned")
            .push((access_key.to_string(), query.map(str::to_string)));
        let result = self.next();
        Box::pin(async move { result })
    }
}

/// A document held as a list of lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryEditor {
    lines: Vec<String>,
    cursor_line: usize,
}

impl MemoryEditor {
    pub fn new<S: Into<String>>(lines: Vec<S>, cursor_line: usize) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            cursor_line,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn move_cursor(&mut self, line: usize) {
        self.cursor_line = line;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl Editor for MemoryEditor {
    fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    /// Lines past the end are padded with empty lines first.
    fn set_line(&mut self, line: usize, text: &str) {
        if line >= self.lines.len() {
            self.lines.resize(line + 1, String::new());
        }
        self.lines[line] = text.to_string();
    }
}

/// Collects notices instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.messages
            .lock()
            .expect("lock poisoned")
            .push(message.to_string());
    }
}

/// Records command registrations and rendered settings controls.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub commands: Vec<Command>,
    pub headings: Vec<String>,
    pub inputs: Vec<TextSetting>,
}

impl CommandRegistry for RecordingHost {
    fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl SettingsPanel for RecordingHost {
    fn clear(&mut self) {
        self.headings.clear();
        self.inputs.clear();
    }

    fn heading(&mut self, text: &str) {
        self.headings.push(text.to_string());
    }

    fn text_input(&mut self, setting: TextSetting) {
        self.inputs.push(setting);
    }
}

pub mod fixtures {
    use serde_json::{json, Value};

    use crate::types::FetchedImage;

    pub fn fetched_image() -> FetchedImage {
        FetchedImage {
            url: "https://images.unsplash.com/photo-1417325384643-aac51acc9e5d?ixlib=rb-4.0.3&q=85&fm=jpg"
                .into(),
            author_name: "jdoe".into(),
            author_profile_url: "https://unsplash.com/@jdoe".into(),
        }
    }

    /// A trimmed-down `GET /photos/random` body matching [`fetched_image`].
    pub fn random_photo_json() -> Value {
        let image = fetched_image();
        json!({
            "id": "Dwu85P9SOIk",
            "created_at": "2016-05-03T11:00:28-04:00",
            "width": 2448,
            "height": 3264,
            "color": "#6E633A",
            "description": "A man drinking a coffee.",
            "urls": {
                "raw": "https://images.unsplash.com/photo-1417325384643-aac51acc9e5d",
                "full": image.url,
                "regular": "https://images.unsplash.com/photo-1417325384643-aac51acc9e5d?w=1080",
                "small": "https://images.unsplash.com/photo-1417325384643-aac51acc9e5d?w=400",
                "thumb": "https://images.unsplash.com/photo-1417325384643-aac51acc9e5d?w=200"
            },
            "links": {
                "self": "https://api.unsplash.com/photos/Dwu85P9SOIk",
                "html": "https://unsplash.com/photos/Dwu85P9SOIk"
            },
            "user": {
                "id": "QPxL2MGqfrw",
                "username": image.author_name,
                "name": "Jane Doe",
                "links": {
                    "self": "https://api.unsplash.com/users/jdoe",
                    "html": image.author_profile_url,
                    "photos": "https://api.unsplash.com/users/jdoe/photos"
                }
            }
        })
    }
}
