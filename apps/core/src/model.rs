use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One searchable application with its lowercase fields computed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    name_lower: String,
    id_lower: String,
    description_lower: String,
    id_parts: Vec<String>,
    name_words: Vec<String>,
}

impl CorpusEntry {
    pub fn new(id: &str, name: &str, description: &str, icon: &str) -> Self {
        Self::from_owned(
            id.to_string(),
            name.to_string(),
            description.to_string(),
            icon.to_string(),
        )
    }

    pub fn from_owned(id: String, name: String, description: String, icon: String) -> Self {
        let name_lower = name.to_lowercase();
        let id_lower = id.to_lowercase();
        let description_lower = description.to_lowercase();
        let id_parts = split_identifier(&id_lower);
        let name_words = split_words(&name_lower);
        Self {
            id,
            name,
            description,
            icon,
            name_lower,
            id_lower,
            description_lower,
            id_parts,
            name_words,
        }
    }

    pub fn name_lower(&self) -> &str {
        &self.name_lower
    }

    pub fn id_lower(&self) -> &str {
        &self.id_lower
    }

    pub fn description_lower(&self) -> &str {
        &self.description_lower
    }

    pub fn id_parts(&self) -> &[String] {
        &self.id_parts
    }

    pub fn name_words(&self) -> &[String] {
        &self.name_words
    }
}

fn split_identifier(id_lower: &str) -> Vec<String> {
    let stem = id_lower.strip_suffix(".desktop").unwrap_or(id_lower);
    stem.split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_words(name_lower: &str) -> Vec<String> {
    name_lower
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// A compiled-in settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsEntry {
    pub name: &'static str,
    pub panel: &'static str,
    pub icon: &'static str,
    pub keywords: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Application,
    SettingsPanel,
    Document,
}

impl ResultKind {
    pub fn header(self) -> &'static str {
        match self {
            Self::Application => "Applications",
            Self::SettingsPanel => "Settings",
            Self::Document => "Documents",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Application(Arc<CorpusEntry>),
    SettingsPanel { panel: String },
    Document { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub score: f64,
    pub payload: ResultPayload,
}

impl ScoredResult {
    pub fn application(entry: Arc<CorpusEntry>, score: f64) -> Self {
        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            icon: entry.icon.clone(),
            score,
            payload: ResultPayload::Application(entry),
        }
    }

    pub fn settings_panel(entry: &SettingsEntry, score: f64) -> Self {
        Self {
            name: entry.name.to_string(),
            description: String::new(),
            icon: entry.icon.to_string(),
            score,
            payload: ResultPayload::SettingsPanel {
                panel: entry.panel.to_string(),
            },
        }
    }

    pub fn document(name: &str, path: &Path, icon: &str, score: f64) -> Self {
        let description = path
            .parent()
            .map(|parent| parent.display().to_string())
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            description,
            icon: icon.to_string(),
            score,
            payload: ResultPayload::Document {
                path: path.to_path_buf(),
            },
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self.payload {
            ResultPayload::Application(_) => ResultKind::Application,
            ResultPayload::SettingsPanel { .. } => ResultKind::SettingsPanel,
            ResultPayload::Document { .. } => ResultKind::Document,
        }
    }

    /// Key under which selections of this result are learned.
    pub fn result_id(&self) -> String {
        match &self.payload {
            ResultPayload::Application(entry) => entry.id.clone(),
            ResultPayload::SettingsPanel { panel } => format!("settings:{panel}"),
            ResultPayload::Document { path } => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    All,
    Apps,
    Documents,
    Settings,
    Folders,
}

impl Category {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "apps" | "applications" => Some(Self::Apps),
            "documents" | "docs" => Some(Self::Documents),
            "settings" => Some(Self::Settings),
            "folders" => Some(Self::Folders),
            _ => None,
        }
    }

    pub fn admits(self, kind: ResultKind) -> bool {
        match self {
            Self::All => true,
            Self::Apps => kind == ResultKind::Application,
            Self::Settings => kind == ResultKind::SettingsPanel,
            Self::Documents | Self::Folders => kind == ResultKind::Document,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::All => "all",
            Self::Apps => "apps",
            Self::Documents => "documents",
            Self::Settings => "settings",
            Self::Folders => "folders",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub generation: u64,
    pub category: Category,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Shared view of the newest query generation. Clones observe the same counter,
/// so background work can tell when it has been superseded.
#[derive(Debug, Clone, Default)]
pub struct GenerationToken(Arc<AtomicU64>);

impl GenerationToken {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

pub fn normalize_query(input: &str) -> String {
    input.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_query, Category, CorpusEntry, GenerationToken, ResultKind};

    #[test]
    fn corpus_entry_precomputes_parts_and_words() {
        let entry = CorpusEntry::new(
            "org.gnome.TextEditor.desktop",
            "Text Editor",
            "Edit text files",
            "text-editor",
        );
        assert_eq!(entry.id_parts(), ["org", "gnome", "texteditor"]);
        assert_eq!(entry.name_words(), ["text", "editor"]);
        assert_eq!(entry.name_lower(), "text editor");
    }

    #[test]
    fn folders_and_documents_share_a_filter() {
        assert!(Category::Folders.admits(ResultKind::Document));
        assert!(Category::Documents.admits(ResultKind::Document));
        assert!(!Category::Apps.admits(ResultKind::Document));
    }

    #[test]
    fn generation_token_clones_share_state() {
        let token = GenerationToken::default();
        let observer = token.clone();
        let generation = token.advance();
        assert!(observer.is_current(generation));
        token.advance();
        assert!(!observer.is_current(generation));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_query("  FireFox "), "firefox");
    }
}
