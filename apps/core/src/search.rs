use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::fuzzy::fuzzy_score;
use crate::learning::LearningStore;
use crate::model::{CorpusEntry, ScoredResult, SettingsEntry};
use crate::synonyms::SynonymIndex;

pub const CONTENT_MATCH_SCORE: f64 = 25.0;

const FUZZY_ACCEPT_THRESHOLD: f64 = 10.0;
const FUZZY_CAP: f64 = 45.0;

/// Read-only inputs shared by every application candidate of one query.
pub struct AppScoring<'a> {
    pub synonyms: &'a SynonymIndex,
    pub synonym_matches: HashSet<String>,
    pub learning: &'a LearningStore,
}

impl<'a> AppScoring<'a> {
    pub fn new(query: &str, synonyms: &'a SynonymIndex, learning: &'a LearningStore) -> Self {
        Self {
            synonyms,
            synonym_matches: synonyms.expand(query),
            learning,
        }
    }
}

pub fn search_applications(
    entries: &[Arc<CorpusEntry>],
    query: &str,
    scoring: &AppScoring<'_>,
) -> Vec<ScoredResult> {
    if query.is_empty() {
        return Vec::new();
    }

    entries
        .iter()
        .filter_map(|entry| {
            let score = score_application(query, entry, scoring);
            (score > 0.0).then(|| ScoredResult::application(Arc::clone(entry), score))
        })
        .collect()
}

pub fn search_settings(panels: &[SettingsEntry], query: &str) -> Vec<ScoredResult> {
    if query.is_empty() {
        return Vec::new();
    }

    panels
        .iter()
        .filter_map(|panel| {
            let score = score_settings_panel(query, panel);
            (score > 0.0).then(|| ScoredResult::settings_panel(panel, score))
        })
        .collect()
}

pub fn score_application(query: &str, entry: &CorpusEntry, scoring: &AppScoring<'_>) -> f64 {
    let base = base_application_score(query, entry, scoring);
    if base <= 0.0 {
        return 0.0;
    }
    base + scoring.learning.score(query, &entry.id)
}

fn base_application_score(query: &str, entry: &CorpusEntry, scoring: &AppScoring<'_>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let name = entry.name_lower();
    if name == query {
        return 100.0;
    }
    if name.starts_with(query) {
        return 85.0;
    }
    if entry.name_words().iter().any(|word| word.starts_with(query)) {
        return 75.0;
    }
    if name.contains(query) {
        return 65.0;
    }
    if scoring
        .synonym_matches
        .iter()
        .any(|app| name.contains(app.as_str()) || entry.id_lower().contains(app.as_str()))
    {
        return 60.0;
    }

    let parts = entry.id_parts();
    if parts.iter().any(|part| part == query) {
        return 70.0;
    }
    if parts.iter().any(|part| part.starts_with(query)) {
        return 55.0;
    }
    if parts.iter().any(|part| part.contains(query)) {
        return 45.0;
    }

    if entry.id_lower().contains(query) {
        return 50.0;
    }

    let fuzzy = fuzzy_score(query, name);
    if fuzzy > FUZZY_ACCEPT_THRESHOLD {
        return fuzzy.min(FUZZY_CAP);
    }

    if entry.description_lower().contains(query) {
        return 25.0;
    }

    let reverse_hit = scoring
        .synonyms
        .terms_for(name)
        .is_some_and(|terms| terms.iter().any(|term| term.contains(query) || query.contains(term.as_str())));
    if reverse_hit {
        return 55.0;
    }

    0.0
}

pub fn score_settings_panel(query: &str, panel: &SettingsEntry) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let name = panel.name.to_lowercase();
    if name == query {
        95.0
    } else if name.starts_with(query) {
        75.0
    } else if name.contains(query) {
        55.0
    } else if panel.keywords.iter().any(|keyword| keyword.starts_with(query)) {
        45.0
    } else if panel.keywords.iter().any(|keyword| keyword.contains(query)) {
        25.0
    } else {
        0.0
    }
}

/// Name-based tiers for a file; content matches are scored separately.
pub fn score_document(query: &str, file_name: &str) -> f64 {
    if query.is_empty() || file_name.is_empty() {
        return 0.0;
    }

    let lower = file_name.to_lowercase();
    let stem = Path::new(&lower)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(lower.as_str());

    if stem == query {
        90.0
    } else if stem.starts_with(query) {
        70.0
    } else if stem.contains(query) {
        50.0
    } else if lower.contains(query) {
        30.0
    } else {
        0.0
    }
}
