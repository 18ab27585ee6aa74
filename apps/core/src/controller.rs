use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Instant};

use crate::action_executor::{Activator, LaunchError};
use crate::aggregate::{arrange, collect_and_display, DisplayView};
use crate::config::{Config, ConfigKey};
use crate::corpus::CorpusCache;
use crate::discovery::CatalogProvider;
use crate::documents::{
    DirectoryLister, DocumentSearch, DocumentSearchOptions, ScanEvent, ScanProgress, ScanRequest,
};
use crate::learning::LearningStore;
use crate::loader::{
    DeferredLoadTask, DeferredLoader, IconSlot, OVERVIEW_ICON_BATCH, RESULT_ICON_BATCH,
};
use crate::model::{
    normalize_query, Category, GenerationToken, Query, ResultKind, ResultPayload, ScoredResult,
};
use crate::search::{search_applications, search_settings, AppScoring};
use crate::settings::SETTINGS_PANELS;
use crate::synonyms::SynonymIndex;
use crate::view_state::{ViewMode, ViewState, ViewTransition};

pub const OVERVIEW_TILE_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewTile {
    pub id: String,
    pub name: String,
    pub icon: String,
}

/// One display pass for the current query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsUpdate {
    pub generation: u64,
    pub query: String,
    pub category: Category,
    pub view: DisplayView,
    pub loading_more: bool,
}

/// The UI side of the engine. Each `show_*` call returns one icon slot per
/// displayed row, in row order; the sink owns the slots, the engine only
/// keeps weak references to them.
pub trait DisplaySink {
    type Slot: IconSlot;

    fn mode_changed(&mut self, _mode: ViewMode) {}
    fn show_overview(&mut self, tiles: &[OverviewTile]) -> Vec<Arc<Self::Slot>>;
    fn show_results(&mut self, update: &ResultsUpdate) -> Vec<Arc<Self::Slot>>;
}

#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("no result selected")]
    NothingDisplayed,
    #[error("selected index out of range: {index} (len={len})")]
    OutOfRange { index: usize, len: usize },
    #[error("launch failed: {0}")]
    Launch(#[from] LaunchError),
}

pub struct Collaborators {
    pub catalog: Box<dyn CatalogProvider>,
    pub lister: Arc<dyn DirectoryLister>,
    pub activator: Box<dyn Activator>,
    pub learning: LearningStore,
}

/// Shared ranking state, written only by its owning subsystem.
pub struct EngineContext {
    pub corpus: CorpusCache,
    pub synonyms: SynonymIndex,
    pub learning: LearningStore,
}

pub struct QueryController<D: DisplaySink> {
    config: Config,
    context: EngineContext,
    catalog: Box<dyn CatalogProvider>,
    documents: DocumentSearch,
    activator: Box<dyn Activator>,
    display: D,
    view: ViewState,
    token: GenerationToken,
    query: Query,
    debounce_deadline: Option<Instant>,
    app_results: Vec<ScoredResult>,
    settings_results: Vec<ScoredResult>,
    document_results: Vec<ScoredResult>,
    scan: Option<ScanProgress>,
    displayed: DisplayView,
    result_icons: DeferredLoader<D::Slot>,
    overview_icons: DeferredLoader<D::Slot>,
    scan_tx: UnboundedSender<ScanEvent>,
    scan_rx: UnboundedReceiver<ScanEvent>,
}

impl<D: DisplaySink> QueryController<D> {
    pub fn new(config: Config, collaborators: Collaborators, display: D) -> Self {
        let corpus = CorpusCache::from_provider(collaborators.catalog.as_ref());
        let synonyms = SynonymIndex::from_table(&config.synonyms);
        let documents = DocumentSearch::new(
            collaborators.lister,
            DocumentSearchOptions::from_config(&config),
        );
        let (scan_tx, scan_rx) = mpsc::unbounded_channel();

        Self {
            config,
            context: EngineContext {
                corpus,
                synonyms,
                learning: collaborators.learning,
            },
            catalog: collaborators.catalog,
            documents,
            activator: collaborators.activator,
            display,
            view: ViewState::default(),
            token: GenerationToken::default(),
            query: Query::default(),
            debounce_deadline: None,
            app_results: Vec::new(),
            settings_results: Vec::new(),
            document_results: Vec::new(),
            scan: None,
            displayed: DisplayView::Empty,
            result_icons: DeferredLoader::new(RESULT_ICON_BATCH),
            overview_icons: DeferredLoader::new(OVERVIEW_ICON_BATCH),
            scan_tx,
            scan_rx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn displayed(&self) -> &DisplayView {
        &self.displayed
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.debounce_deadline.is_some()
    }

    pub fn result_icons_pending(&self) -> usize {
        self.result_icons.len()
    }

    pub fn overview_icons_pending(&self) -> usize {
        self.overview_icons.len()
    }

    /// Scan events received but not yet handled.
    pub fn queued_scan_events(&self) -> usize {
        self.scan_rx.len()
    }

    pub fn is_loading_more(&self) -> bool {
        self.scan.as_ref().is_some_and(|scan| !scan.is_settled())
    }

    /// Nothing is waiting on a timer, a scan, or an icon batch.
    pub fn is_idle(&self) -> bool {
        self.debounce_deadline.is_none()
            && !self.is_loading_more()
            && !self.result_icons.has_pending()
            && !self.overview_icons.has_pending()
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.view.is_visible() {
            return;
        }
        self.view.set_visible(visible);
        if visible {
            self.show_overview();
        } else {
            self.reset_session();
        }
    }

    fn reset_session(&mut self) {
        self.query.generation = self.token.advance();
        self.query.text.clear();
        self.debounce_deadline = None;
        self.clear_results();
        self.drop_queued_scan_events();
        self.result_icons.discard();
        self.overview_icons.discard();
        self.overview_icons.resume();
    }

    fn clear_results(&mut self) {
        self.app_results.clear();
        self.settings_results.clear();
        self.document_results.clear();
        self.scan = None;
        self.displayed = DisplayView::Empty;
    }

    /// Handles one keystroke. The mode switch is immediate; scoring waits for
    /// the debounce window to pass without further input.
    pub fn set_query(&mut self, text: &str) {
        self.query.text = normalize_query(text);
        self.query.generation = self.token.advance();
        self.result_icons.discard();
        self.scan = None;
        self.drop_queued_scan_events();

        let is_empty = self.query.is_empty();
        match self.view.on_query(is_empty) {
            Some(ViewTransition::EnterSearching) => {
                self.overview_icons.pause();
                self.display.mode_changed(ViewMode::Searching);
            }
            Some(ViewTransition::ReturnToOverview) => {
                self.clear_results();
                self.display.mode_changed(ViewMode::Overview);
                self.overview_icons.resume();
            }
            None => {}
        }

        self.debounce_deadline =
            (!is_empty).then(|| Instant::now() + Duration::from_millis(self.config.debounce_ms));
    }

    pub fn set_category(&mut self, category: Category) {
        if !self.config.category_enabled(category) {
            tracing::debug!(%category, "category disabled; ignoring");
            return;
        }
        if self.query.category == category {
            return;
        }
        self.query.category = category;
        if self.query.is_empty() {
            return;
        }

        self.query.generation = self.token.advance();
        self.result_icons.discard();
        self.debounce_deadline = None;
        self.run_search();
    }

    /// Runs the pending scoring pass once its debounce deadline has passed.
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        match self.debounce_deadline {
            Some(deadline) if now >= deadline => {
                self.debounce_deadline = None;
                self.run_search();
                true
            }
            _ => false,
        }
    }

    /// Skips the remaining debounce wait.
    pub fn flush_debounce(&mut self) -> bool {
        if self.debounce_deadline.take().is_some() {
            self.run_search();
            return true;
        }
        false
    }

    fn run_search(&mut self) {
        let query = self.query.text.clone();
        if query.is_empty() {
            return;
        }
        let category = self.query.category;

        self.app_results = if self.config.search_apps && category.admits(ResultKind::Application)
        {
            let scoring = AppScoring::new(&query, &self.context.synonyms, &self.context.learning);
            search_applications(self.context.corpus.entries(), &query, &scoring)
        } else {
            Vec::new()
        };
        self.settings_results =
            if self.config.search_settings && category.admits(ResultKind::SettingsPanel) {
                search_settings(SETTINGS_PANELS, &query)
            } else {
                Vec::new()
            };
        self.document_results.clear();
        self.drop_queued_scan_events();

        self.scan = if self.wants_documents(&query, category) {
            let request = ScanRequest {
                query: query.clone(),
                generation: self.query.generation,
                token: self.token.clone(),
            };
            Some(self.documents.start(request, &self.scan_tx))
        } else {
            None
        };

        tracing::debug!(
            query = %query,
            generation = self.query.generation,
            apps = self.app_results.len(),
            settings = self.settings_results.len(),
            documents = self.scan.is_some(),
            "search pass"
        );
        self.redisplay();
    }

    /// Everything queued predates the current generation once it has advanced.
    fn drop_queued_scan_events(&mut self) {
        let mut dropped = 0_usize;
        while self.scan_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded superseded scan events");
        }
    }

    fn wants_documents(&self, query: &str, category: Category) -> bool {
        self.config.search_documents
            && self.config.document_search_enabled
            && category.admits(ResultKind::Document)
            && self.documents.accepts_query(query)
            && !self.documents.options().roots.is_empty()
    }

    /// Applies one scan event. Events from any generation other than the
    /// current one are dropped without touching the displayed results.
    pub fn handle_scan_event(&mut self, event: ScanEvent) {
        let generation = event.generation();
        if generation != self.query.generation || !self.token.is_current(generation) {
            tracing::debug!(generation, current = self.query.generation, "dropping stale scan event");
            return;
        }

        let refresh = {
            let Some(scan) = self
                .scan
                .as_mut()
                .filter(|scan| scan.generation() == generation)
            else {
                return;
            };

            match event {
                ScanEvent::Batch { matches, .. } => {
                    self.document_results.extend(matches);
                    true
                }
                ScanEvent::ContentRead { result, .. } => {
                    scan.content_read_done();
                    match result {
                        Some(result) => {
                            self.document_results.push(result);
                            true
                        }
                        None => scan.is_settled(),
                    }
                }
                ScanEvent::DirectoryFinished {
                    root,
                    content_reads,
                    ..
                } => {
                    let complete = scan.finish_directory(root, content_reads);
                    if complete {
                        tracing::debug!(generation, "document scan complete");
                    }
                    complete
                }
            }
        };

        if refresh {
            self.redisplay();
        }
    }

    fn redisplay(&mut self) {
        let category = self.query.category;
        let merged = collect_and_display(
            &self.app_results,
            &self.settings_results,
            &self.document_results,
            category,
            usize::from(self.config.max_results),
        );
        let update = ResultsUpdate {
            generation: self.query.generation,
            query: self.query.text.clone(),
            category,
            view: arrange(merged, category),
            loading_more: self.is_loading_more(),
        };

        let slots = self.display.show_results(&update);
        self.result_icons.replace(
            update
                .view
                .rows()
                .into_iter()
                .zip(slots.iter())
                .map(|(row, slot)| DeferredLoadTask::new(slot, row.icon.clone())),
        );
        self.displayed = update.view;
    }

    fn show_overview(&mut self) {
        let tiles = self.overview_tiles();
        let slots = self.display.show_overview(&tiles);
        self.overview_icons.replace(
            tiles
                .iter()
                .zip(slots.iter())
                .map(|(tile, slot)| DeferredLoadTask::new(slot, tile.icon.clone())),
        );
    }

    /// Most-used applications first, then alphabetical.
    pub fn overview_tiles(&self) -> Vec<OverviewTile> {
        let usage: HashMap<String, f64> = self.context.learning.most_used().into_iter().collect();
        let mut ranked: Vec<_> = self
            .context
            .corpus
            .entries()
            .iter()
            .map(|entry| (usage.get(&entry.id).copied().unwrap_or(0.0), entry))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));

        ranked
            .into_iter()
            .take(OVERVIEW_TILE_LIMIT)
            .map(|(_, entry)| OverviewTile {
                id: entry.id.clone(),
                name: entry.name.clone(),
                icon: entry.icon.clone(),
            })
            .collect()
    }

    fn drain_icon_batch(&mut self) {
        if self.result_icons.has_pending() {
            self.result_icons.drain_batch();
        }
        if self.overview_icons.has_pending() {
            self.overview_icons.drain_batch();
        }
    }

    /// Activates the row at `index` in display order and learns the choice.
    pub fn activate_selected(&mut self, index: usize) -> Result<ScoredResult, ActivationError> {
        let rows = self.displayed.rows();
        if rows.is_empty() {
            return Err(ActivationError::NothingDisplayed);
        }
        let Some(selected) = rows.get(index).map(|row| (*row).clone()) else {
            return Err(ActivationError::OutOfRange {
                index,
                len: rows.len(),
            });
        };

        self.context
            .learning
            .record(&self.query.text, &selected.result_id());

        let outcome = match &selected.payload {
            ResultPayload::Application(entry) => self.activator.activate_application(entry),
            ResultPayload::SettingsPanel { panel } => self.activator.open_settings_panel(panel),
            ResultPayload::Document { path } => self.activator.open_file(path),
        };
        if let Err(error) = &outcome {
            tracing::warn!(%error, name = %selected.name, "activation failed");
        }
        outcome.map(|()| selected).map_err(ActivationError::from)
    }

    /// Rebuilds the corpus after an install or uninstall.
    pub fn on_catalog_changed(&mut self) {
        self.context.corpus = CorpusCache::from_provider(self.catalog.as_ref());
        if self.view.is_visible() && !self.view.is_searching() {
            self.show_overview();
        }
    }

    pub fn apply_config(&mut self, config: Config) -> Vec<ConfigKey> {
        let changed = self.config.changed_keys(&config);
        self.config = config;

        for key in &changed {
            match key {
                ConfigKey::Synonyms => {
                    self.context.synonyms = SynonymIndex::from_table(&self.config.synonyms);
                    tracing::info!(terms = self.context.synonyms.len(), "synonyms reloaded");
                }
                ConfigKey::SearchedFolders
                | ConfigKey::ContentSearch
                | ConfigKey::MaxContentSearchBytes
                | ConfigKey::ScanLimits => {
                    self.documents
                        .set_options(DocumentSearchOptions::from_config(&self.config));
                }
                ConfigKey::CategoryFlags => {
                    if !self.config.category_enabled(self.query.category) {
                        self.query.category = Category::All;
                    }
                }
                ConfigKey::LearningDbPath => {
                    tracing::info!("learning database path change applies on restart");
                }
                ConfigKey::MaxResults | ConfigKey::DocumentSearch | ConfigKey::Debounce => {}
            }
        }
        changed
    }

    /// One scheduler turn: a due debounce, a scan event, or an icon batch.
    /// Returns `false` when there was nothing to wait for.
    pub async fn step(&mut self) -> bool {
        let deadline = self.debounce_deadline;
        let scanning = self.is_loading_more();
        let icons = self.result_icons.has_pending() || self.overview_icons.has_pending();
        if deadline.is_none() && !scanning && !icons {
            return false;
        }

        tokio::select! {
            biased;
            Some(event) = self.scan_rx.recv(), if scanning => self.handle_scan_event(event),
            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                self.poll_debounce(Instant::now());
            }
            _ = tokio::task::yield_now(), if icons => self.drain_icon_batch(),
            else => {}
        }
        true
    }

    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }
}
