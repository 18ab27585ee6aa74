use std::collections::{BTreeMap, HashMap};

use crate::model::normalize_query;
use crate::store::StoreError;

pub const MAX_BOOST: f64 = 50.0;
const BOOST_SCALE: f64 = 15.0;
const PREFIX_WEIGHT: f64 = 0.5;
const MIN_QUERY_CHARS: usize = 2;

pub type LearningTable = BTreeMap<String, BTreeMap<String, f64>>;

pub trait LearningPersistence: Send {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, blob: &str) -> Result<(), StoreError>;
}

/// Per-query selection counts used as an additive ranking boost.
#[derive(Default)]
pub struct LearningStore {
    table: HashMap<String, HashMap<String, f64>>,
    persistence: Option<Box<dyn LearningPersistence>>,
}

impl std::fmt::Debug for LearningStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningStore")
            .field("queries", &self.table.len())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl LearningStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the persisted table; unreadable or corrupt data starts empty.
    pub fn open(persistence: Box<dyn LearningPersistence>) -> Self {
        let table = match persistence.load() {
            Ok(Some(blob)) => parse_blob(&blob),
            Ok(None) => HashMap::new(),
            Err(error) => {
                tracing::warn!(%error, "learning table unreadable; starting empty");
                HashMap::new()
            }
        };
        Self {
            table,
            persistence: Some(persistence),
        }
    }

    pub fn from_blob(blob: &str) -> Self {
        Self {
            table: parse_blob(blob),
            persistence: None,
        }
    }

    pub fn record(&mut self, query: &str, result_id: &str) {
        let normalized = normalize_query(query);
        if normalized.chars().count() < MIN_QUERY_CHARS || result_id.is_empty() {
            return;
        }

        self.bump(&normalized, result_id, 1.0);
        for (index, ch) in normalized.char_indices().skip(MIN_QUERY_CHARS - 1) {
            let end = index + ch.len_utf8();
            if end == normalized.len() {
                break;
            }
            self.bump(&normalized[..end], result_id, PREFIX_WEIGHT);
        }

        self.persist();
    }

    fn bump(&mut self, query: &str, result_id: &str, weight: f64) {
        *self
            .table
            .entry(query.to_string())
            .or_default()
            .entry(result_id.to_string())
            .or_insert(0.0) += weight;
    }

    pub fn count(&self, query: &str, result_id: &str) -> Option<f64> {
        self.table
            .get(&normalize_query(query))
            .and_then(|results| results.get(result_id))
            .copied()
    }

    pub fn score(&self, query: &str, result_id: &str) -> f64 {
        match self.count(query, result_id) {
            Some(count) => ((count + 1.0).log2() * BOOST_SCALE).min(MAX_BOOST),
            None => 0.0,
        }
    }

    /// Total learned weight per result id, heaviest first.
    pub fn most_used(&self) -> Vec<(String, f64)> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for results in self.table.values() {
            for (id, weight) in results {
                *totals.entry(id.as_str()).or_insert(0.0) += weight;
            }
        }

        let mut ranked: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(id, weight)| (id.to_string(), weight))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn to_table(&self) -> LearningTable {
        self.table
            .iter()
            .map(|(query, results)| {
                let results = results
                    .iter()
                    .map(|(id, weight)| (id.clone(), *weight))
                    .collect();
                (query.clone(), results)
            })
            .collect()
    }

    pub fn to_blob(&self) -> String {
        serde_json::to_string(&self.to_table()).unwrap_or_else(|_| "{}".to_string())
    }

    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(error) = persistence.save(&self.to_blob()) {
            tracing::warn!(%error, "failed to persist learning table");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn parse_blob(blob: &str) -> HashMap<String, HashMap<String, f64>> {
    match serde_json::from_str::<LearningTable>(blob) {
        Ok(table) => table
            .into_iter()
            .map(|(query, results)| {
                let results = results
                    .into_iter()
                    .filter(|(_, weight)| weight.is_finite() && *weight >= 0.0)
                    .collect();
                (query, results)
            })
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "learning table is corrupt; starting empty");
            HashMap::new()
        }
    }
}
