//! Seam to the host editor.
//!
//! The editor supplies the selection, applies replacements, shows status
//! messages and owns the settings directory. Everything else lives in this
//! crate.

use std::path::PathBuf;

use crate::command::{CommandResult, Runner};
use crate::config::{FormatSettings, ProfileStore, Settings, SettingsError};
use crate::connection::Connection;
use crate::format::format_sql;

/// What sqltools needs from an editor.
pub trait EditorHost {
    /// Currently selected text, `None` when the selection is empty.
    fn selected_text(&self) -> Option<String>;

    /// Replace the current selection.
    fn replace_selection(&mut self, text: &str);

    /// Show a short status message.
    fn status(&mut self, message: &str);

    /// Writable directory for the settings and connections files.
    fn settings_dir(&self) -> PathBuf;
}

/// Load settings and profiles from the editor's settings directory.
pub fn load_config<H: EditorHost + ?Sized>(host: &H) -> Result<(Settings, ProfileStore), SettingsError> {
    let dir = host.settings_dir();
    let settings = Settings::load_from_dir(&dir)?;
    let profiles = ProfileStore::load_from_dir(&dir)?;
    Ok((settings, profiles))
}

/// Format the selection in place. Returns whether anything changed.
pub fn format_selection<H: EditorHost + ?Sized>(host: &mut H, options: &FormatSettings) -> bool {
    let Some(text) = host.selected_text() else {
        return false;
    };

    match format_sql(&text, options) {
        Some(formatted) => {
            host.replace_selection(&formatted);
            true
        }
        None => {
            host.status("SQLTools: could not format the selection");
            false
        }
    }
}

/// Execute the selection on `connection`.
///
/// Returns `Ok(None)` without running anything when nothing is selected.
pub async fn execute_selection<H, R>(
    host: &mut H,
    connection: &Connection<R>,
) -> CommandResult<Option<String>>
where
    H: EditorHost + ?Sized,
    R: Runner,
{
    let Some(query) = host.selected_text() else {
        host.status("SQLTools: no query selected");
        return Ok(None);
    };

    host.status("SQLTools: running SQL command");
    let output = connection.execute(&query).await?;
    host.status(&format!("SQLTools: done ({})", connection.profile().name));
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CliSpec, ExecutionResult, Invocation};
    use crate::config::LetterCase;
    use crate::history::HistoryRing;
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeEditor {
        selection: Option<String>,
        messages: Vec<String>,
        dir: PathBuf,
    }

    impl EditorHost for FakeEditor {
        fn selected_text(&self) -> Option<String> {
            self.selection.clone().filter(|s| !s.is_empty())
        }

        fn replace_selection(&mut self, text: &str) {
            self.selection = Some(text.to_string());
        }

        fn status(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }

        fn settings_dir(&self) -> PathBuf {
            self.dir.clone()
        }
    }

    struct EchoRunner;

    #[async_trait]
    impl Runner for EchoRunner {
        async fn run(&self, invocation: &Invocation) -> CommandResult<ExecutionResult> {
            Ok(ExecutionResult {
                output: invocation.input().to_string(),
                status: None,
            })
        }
    }

    fn keyword_upper() -> FormatSettings {
        FormatSettings {
            keyword_case: Some(LetterCase::Upper),
            reindent: false,
            ..FormatSettings::default()
        }
    }

    #[test]
    fn test_format_selection_replaces_text() {
        let mut editor = FakeEditor {
            selection: Some("select qty_left from widget_stock".to_string()),
            ..Default::default()
        };
        assert!(format_selection(&mut editor, &keyword_upper()));
        assert_eq!(
            editor.selection.as_deref(),
            Some("SELECT qty_left FROM widget_stock")
        );
    }

    #[test]
    fn test_format_selection_leaves_bad_sql() {
        let mut editor = FakeEditor {
            selection: Some("select 'unterminated".to_string()),
            ..Default::default()
        };
        assert!(!format_selection(&mut editor, &keyword_upper()));
        assert_eq!(editor.selection.as_deref(), Some("select 'unterminated"));
        assert_eq!(editor.messages.len(), 1);
    }

    #[test]
    fn test_format_empty_selection() {
        let mut editor = FakeEditor::default();
        assert!(!format_selection(&mut editor, &keyword_upper()));
    }

    #[tokio::test]
    async fn test_execute_selection() {
        let profiles = ProfileStore::parse(
            r#"{ "connections": { "lite": {
                "type": "sqlite", "host": "", "port": 0, "username": "", "database": "app.db"
            } } }"#,
        )
        .unwrap();
        let connection = Connection::with_runner(
            profiles.get("lite").unwrap().clone(),
            CliSpec::default(),
            "sqlite3",
            EchoRunner,
            HistoryRing::shared(5),
        );

        let mut editor = FakeEditor::default();
        assert_eq!(execute_selection(&mut editor, &connection).await.unwrap(), None);
        assert_eq!(editor.messages, vec!["SQLTools: no query selected"]);

        editor.selection = Some("select 1;".to_string());
        let output = execute_selection(&mut editor, &connection).await.unwrap();
        assert_eq!(output.as_deref(), Some("select 1;"));
        assert_eq!(connection.history().lock().unwrap().get(0).unwrap(), "select 1;");
    }

    #[test]
    fn test_load_config_seeds_directory() {
        let dir = tempfile::tempdir().unwrap();
        let editor = FakeEditor {
            dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (settings, profiles) = load_config(&editor).unwrap();
        assert!(settings.history_size > 0);
        assert!(!profiles.is_empty());
    }
}
