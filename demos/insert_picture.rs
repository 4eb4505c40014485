//! Drive the plugin from the command line against a markdown file.
//!
//! Run with:
//! ```bash
//! UNSPLASH_ACCESS_KEY=... cargo run --example insert_picture -- notes.md 3
//! ```
//!
//! `UNSPLASH_QUERY` sets the default query. Settings are kept in
//! `.randompic/data.json` (override the directory with `RANDOMPIC_DIR`).

use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;

use randompic::{
    Client, CommandRegistry, Config, Editor, JsonFileSettingsStore, Notifier, RandomPicPlugin,
    SettingKey, SettingsPanel, TextSetting,
};

struct FileEditor {
    lines: Vec<String>,
    cursor: usize,
}

impl Editor for FileEditor {
    fn cursor_line(&self) -> usize {
        self.cursor
    }

    fn set_line(&mut self, line: usize, text: &str) {
        if line >= self.lines.len() {
            self.lines.resize(line + 1, String::new());
        }
        self.lines[line] = text.to_string();
    }
}

struct Console {
    commands: Vec<&'static str>,
}

impl CommandRegistry for Console {
    fn add_command(&mut self, command: randompic::Command) {
        println!("registered command {} ({})", command.id, command.name);
        self.commands.push(command.id);
    }
}

impl SettingsPanel for Console {
    fn heading(&mut self, text: &str) {
        println!("== {text} ==");
    }

    fn text_input(&mut self, setting: TextSetting) {
        let shown = match setting.key {
            SettingKey::AccessKey if !setting.value.is_empty() => "********".to_string(),
            _ => setting.value,
        };
        println!("{}: {shown:?}  ({})", setting.name, setting.description);
    }
}

impl Notifier for Console {
    fn notice(&self, message: &str) {
        eprintln!("notice: {message}");
    }
}

/// A markdown file split into lines, remembering its line ending.
struct Document {
    lines: Vec<String>,
    newline: &'static str,
}

impl Document {
    /// Only a missing file starts as an empty document; any other read error
    /// is returned so the file is never rewritten from a partial view.
    fn read(path: &Path) -> io::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };
        let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
        Ok(Self {
            lines: content.lines().map(str::to_string).collect(),
            newline,
        })
    }

    fn write(&self, path: &Path, lines: &[String]) -> io::Result<()> {
        std::fs::write(path, lines.join(self.newline) + self.newline)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let file = args.next().ok_or("usage: insert_picture <file.md> [line]")?;
    let line: usize = args.next().map(|l| l.parse::<usize>()).transpose()?.unwrap_or(0);

    let dir = std::env::var("RANDOMPIC_DIR").unwrap_or_else(|_| ".randompic".to_string());
    let store = Arc::new(JsonFileSettingsStore::in_dir(dir));
    let client = Arc::new(Client::new(Config::default())?);
    let mut plugin = RandomPicPlugin::load(store, client)?;

    if let Ok(key) = std::env::var("UNSPLASH_ACCESS_KEY") {
        plugin.on_setting_changed(SettingKey::AccessKey, key)?;
    }
    if let Ok(query) = std::env::var("UNSPLASH_QUERY") {
        plugin.on_setting_changed(SettingKey::Query, query)?;
    }

    let mut console = Console {
        commands: Vec::new(),
    };
    plugin.on_load(&mut console);
    plugin.display_settings(&mut console);

    let document = Document::read(Path::new(&file))?;
    let mut editor = FileEditor {
        lines: document.lines.clone(),
        cursor: line,
    };

    let command = console.commands[0];
    if let Some(outcome) = plugin.run_command(command, &mut editor, &console).await {
        println!("{outcome:?}");
        if matches!(outcome, randompic::InsertOutcome::Inserted { .. }) {
            document.write(Path::new(&file), &editor.lines)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = Document::read(&dir.path().join("new.md")).unwrap();
        assert!(doc.lines.is_empty());
        assert_eq!(doc.newline, "\n");
    }

    #[test]
    fn unreadable_file_is_an_error_and_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("binary.md");
        std::fs::write(&path, b"# notes\n\xff\n").unwrap();

        let err = Document::read(&path).err().expect("invalid utf-8 is not a document");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(std::fs::read(&path).unwrap(), b"# notes\n\xff\n");
    }

    #[test]
    fn crlf_line_endings_are_kept() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "a\r\nb\r\n").unwrap();

        let doc = Document::read(&path).unwrap();
        assert_eq!(doc.lines, ["a", "b"]);
        doc.write(&path, &["a".to_string(), "img".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\r\nimg\r\n");
    }
}
