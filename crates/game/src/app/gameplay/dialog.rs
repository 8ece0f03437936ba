use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine::DialogPanel;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::interaction::{CloseCallback, DialogueService};
use super::{parse_json_with_path, JsonPathError};

const REVEAL_EPSILON_MS: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DialogEntry {
    pub(crate) title: String,
    pub(crate) content: String,
}

#[derive(Debug, Error)]
pub(crate) enum ContentError {
    #[error("failed to read dialog catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dialog catalog {} {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: JsonPathError,
    },
    #[error("dialog '{zone}' has an empty title")]
    EmptyTitle { zone: String },
}

/// Dialog content keyed by zone name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DialogCatalog {
    entries: BTreeMap<String, DialogEntry>,
}

impl DialogCatalog {
    pub(crate) fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    pub(crate) fn from_json_str(raw: &str, origin: &Path) -> Result<Self, ContentError> {
        let entries: BTreeMap<String, DialogEntry> =
            parse_json_with_path(raw).map_err(|source| ContentError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        if let Some((zone, _)) = entries
            .iter()
            .find(|(_, entry)| entry.title.trim().is_empty())
        {
            return Err(ContentError::EmptyTitle { zone: zone.clone() });
        }
        Ok(Self { entries })
    }

    pub(crate) fn get(&self, zone: &str) -> Option<&DialogEntry> {
        self.entries.get(zone)
    }

    pub(crate) fn contains(&self, zone: &str) -> bool {
        self.entries.contains_key(zone)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, DialogEntry)> for DialogCatalog {
    fn from_iter<I: IntoIterator<Item = (String, DialogEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogKeyOutcome {
    Skipped,
    Closed,
    NotOpen,
}

struct OpenDialog {
    zone: String,
    title_line: String,
    content: String,
    revealed_bytes: usize,
    elapsed_ms: f32,
    on_close: Option<CloseCallback>,
}

impl OpenDialog {
    fn is_typing(&self) -> bool {
        self.revealed_bytes < self.content.len()
    }

    fn reveal_next(&mut self) {
        if let Some(ch) = self.content[self.revealed_bytes..].chars().next() {
            self.revealed_bytes += ch.len_utf8();
        }
    }

    fn reveal_all(&mut self) {
        self.revealed_bytes = self.content.len();
    }
}

/// Modal dialog with a typewriter reveal.
pub(crate) struct DialogBox {
    catalog: DialogCatalog,
    char_interval_ms: f32,
    open: Option<OpenDialog>,
}

impl DialogBox {
    pub(crate) fn new(catalog: DialogCatalog, char_interval_ms: u64) -> Self {
        Self {
            catalog,
            char_interval_ms: char_interval_ms as f32,
            open: None,
        }
    }

    pub(crate) fn catalog(&self) -> &DialogCatalog {
        &self.catalog
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn is_typing(&self) -> bool {
        self.open.as_ref().is_some_and(OpenDialog::is_typing)
    }

    pub(crate) fn open_zone(&self) -> Option<&str> {
        self.open.as_ref().map(|dialog| dialog.zone.as_str())
    }

    pub(crate) fn title_line(&self) -> Option<&str> {
        self.open.as_ref().map(|dialog| dialog.title_line.as_str())
    }

    pub(crate) fn visible_body(&self) -> Option<&str> {
        self.open
            .as_ref()
            .map(|dialog| &dialog.content[..dialog.revealed_bytes])
    }

    pub(crate) fn panel(&self) -> Option<DialogPanel> {
        self.open.as_ref().map(|dialog| DialogPanel {
            title: dialog.title_line.clone(),
            body: dialog.content[..dialog.revealed_bytes].to_string(),
            show_cursor: true,
        })
    }

    pub(crate) fn tick(&mut self, dt_seconds: f32) {
        let interval = self.char_interval_ms;
        let Some(dialog) = self.open.as_mut() else {
            return;
        };
        if !dialog.is_typing() {
            return;
        }
        if interval <= 0.0 {
            dialog.reveal_all();
            return;
        }
        dialog.elapsed_ms += dt_seconds.max(0.0) * 1000.0;
        while dialog.is_typing() && dialog.elapsed_ms + REVEAL_EPSILON_MS >= interval {
            dialog.elapsed_ms -= interval;
            dialog.reveal_next();
        }
        if !dialog.is_typing() {
            dialog.elapsed_ms = 0.0;
        }
    }

    /// Reveals the rest of the text. Returns false when nothing was typing.
    pub(crate) fn skip_typewriter(&mut self) -> bool {
        match self.open.as_mut() {
            Some(dialog) if dialog.is_typing() => {
                dialog.reveal_all();
                true
            }
            _ => false,
        }
    }

    /// Enter: finish typing first, close once the text is complete.
    pub(crate) fn press_enter(&mut self) -> DialogKeyOutcome {
        if !self.is_open() {
            return DialogKeyOutcome::NotOpen;
        }
        if self.skip_typewriter() {
            DialogKeyOutcome::Skipped
        } else {
            self.close();
            DialogKeyOutcome::Closed
        }
    }

    /// Returns false when no dialog was open.
    pub(crate) fn close(&mut self) -> bool {
        let Some(mut dialog) = self.open.take() else {
            return false;
        };
        info!(zone = dialog.zone.as_str(), "dialog_closed");
        if let Some(on_close) = dialog.on_close.take() {
            on_close();
        }
        true
    }
}

impl DialogueService for DialogBox {
    fn is_dialogue_open(&self) -> bool {
        self.is_open()
    }

    fn request_open(&mut self, zone: &str, on_close: CloseCallback) -> bool {
        if self.open.is_some() {
            debug!(zone, "dialog_request_ignored_already_open");
            return false;
        }
        let Some(entry) = self.catalog.get(zone) else {
            debug!(zone, "dialog_request_ignored_unknown_zone");
            return false;
        };
        self.open = Some(OpenDialog {
            zone: zone.to_string(),
            title_line: format!("> {}", entry.title),
            content: entry.content.clone(),
            revealed_bytes: 0,
            elapsed_ms: 0.0,
            on_close: Some(on_close),
        });
        info!(zone, chars = entry.content.chars().count(), "dialog_opened");
        true
    }
}
