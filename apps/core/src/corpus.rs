use std::sync::Arc;

use crate::discovery::{CatalogApp, CatalogProvider};
use crate::model::CorpusEntry;

/// Immutable application snapshot. Catalog changes build a fresh cache and
/// swap it in.
#[derive(Debug, Clone, Default)]
pub struct CorpusCache {
    entries: Arc<Vec<Arc<CorpusEntry>>>,
}

impl CorpusCache {
    pub fn build(apps: Vec<CatalogApp>) -> Self {
        let entries: Vec<Arc<CorpusEntry>> = apps
            .into_iter()
            .filter_map(|app| {
                if app.id.trim().is_empty() || app.name.trim().is_empty() {
                    tracing::debug!(id = %app.id, name = %app.name, "skipping malformed catalog entry");
                    return None;
                }
                Some(Arc::new(CorpusEntry::from_owned(
                    app.id,
                    app.name,
                    app.description,
                    app.icon,
                )))
            })
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// A failing provider yields an empty corpus rather than an error.
    pub fn from_provider(provider: &dyn CatalogProvider) -> Self {
        match provider.list_applications() {
            Ok(apps) => {
                let cache = Self::build(apps);
                tracing::info!(
                    provider = provider.provider_name(),
                    entries = cache.len(),
                    "corpus rebuilt"
                );
                cache
            }
            Err(error) => {
                tracing::warn!(provider = provider.provider_name(), %error, "catalog unavailable");
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[Arc<CorpusEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
