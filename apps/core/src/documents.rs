use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use walkdir::WalkDir;

use crate::config::Config;
use crate::discovery::ProviderError;
use crate::model::{GenerationToken, ScoredResult};
use crate::search::{score_document, CONTENT_MATCH_SCORE};

pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "odt", "ods", "odp", "xls", "xlsx", "ppt", "pptx", "rtf", "epub",
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "tex", "org", "rst",
    "log", "yaml", "yml",
];

/// Subset of [`DOCUMENT_EXTENSIONS`] whose bytes are searched as text.
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "tex", "org", "rst",
    "log", "yaml", "yml",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Lists the immediate children of a directory in batches. Returning
/// `ControlFlow::Break` from the callback abandons the listing.
pub trait DirectoryLister: Send + Sync {
    fn list_batches(
        &self,
        dir: &Path,
        batch_size: usize,
        on_batch: &mut dyn FnMut(Vec<DirEntryInfo>) -> ControlFlow<()>,
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirLister;

impl DirectoryLister for WalkDirLister {
    fn list_batches(
        &self,
        dir: &Path,
        batch_size: usize,
        on_batch: &mut dyn FnMut(Vec<DirEntryInfo>) -> ControlFlow<()>,
    ) -> Result<(), ProviderError> {
        let mut batch = Vec::with_capacity(batch_size);
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) if error.depth() == 0 => {
                    return Err(ProviderError::new(format!(
                        "cannot list {}: {error}",
                        dir.display()
                    )))
                }
                Err(_) => continue,
            };
            batch.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_path_buf(),
                is_dir: entry.file_type().is_dir(),
            });
            if batch.len() >= batch_size
                && on_batch(std::mem::replace(&mut batch, Vec::with_capacity(batch_size)))
                    .is_break()
            {
                return Ok(());
            }
        }

        if !batch.is_empty() {
            let _ = on_batch(batch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// Name matches found in one enumerated batch.
    Batch {
        generation: u64,
        root: usize,
        matches: Vec<ScoredResult>,
    },
    /// One content read finished; `result` is set when the file matched.
    ContentRead {
        generation: u64,
        result: Option<ScoredResult>,
    },
    DirectoryFinished {
        generation: u64,
        root: usize,
        content_reads: usize,
    },
}

impl ScanEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Batch { generation, .. }
            | Self::ContentRead { generation, .. }
            | Self::DirectoryFinished { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSearchOptions {
    pub roots: Vec<PathBuf>,
    pub content_search: bool,
    pub max_content_bytes: u64,
    pub per_directory_cap: usize,
    pub batch_size: usize,
    pub min_query_len: usize,
}

impl DocumentSearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            roots: config.searched_folders.clone(),
            content_search: config.content_search_enabled,
            max_content_bytes: config.max_content_search_bytes,
            per_directory_cap: config.per_directory_cap.max(1),
            batch_size: config.directory_batch_size.max(1),
            min_query_len: config.min_document_query_len,
        }
    }
}

/// Bookkeeping for one generation's scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    generation: u64,
    pending_roots: BTreeSet<usize>,
    content_scheduled: usize,
    content_received: usize,
    completion_reported: bool,
}

impl ScanProgress {
    pub fn new(generation: u64, roots: usize) -> Self {
        Self {
            generation,
            pending_roots: (0..roots).collect(),
            content_scheduled: 0,
            content_received: 0,
            completion_reported: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks a directory finished. Returns `true` exactly once: when the last
    /// outstanding directory reports in.
    pub fn finish_directory(&mut self, root: usize, content_reads: usize) -> bool {
        if self.pending_roots.remove(&root) {
            self.content_scheduled += content_reads;
        }
        self.take_completion()
    }

    /// Consumes the completion signal for a scan that had nothing to list.
    pub fn take_completion(&mut self) -> bool {
        if self.pending_roots.is_empty() && !self.completion_reported {
            self.completion_reported = true;
            return true;
        }
        false
    }

    pub fn content_read_done(&mut self) {
        self.content_received += 1;
    }

    pub fn directories_finished(&self) -> bool {
        self.pending_roots.is_empty()
    }

    /// No directory listing or scheduled content read is still outstanding.
    pub fn is_settled(&self) -> bool {
        self.directories_finished() && self.content_received >= self.content_scheduled
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub query: String,
    pub generation: u64,
    pub token: GenerationToken,
}

pub struct DocumentSearch {
    lister: Arc<dyn DirectoryLister>,
    options: DocumentSearchOptions,
}

impl DocumentSearch {
    pub fn new(lister: Arc<dyn DirectoryLister>, options: DocumentSearchOptions) -> Self {
        Self { lister, options }
    }

    pub fn options(&self) -> &DocumentSearchOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DocumentSearchOptions) {
        self.options = options;
    }

    pub fn accepts_query(&self, query: &str) -> bool {
        query.chars().count() >= self.options.min_query_len.max(1)
    }

    /// Spawns one listing task per root. Events for this generation arrive on
    /// `events`; the returned progress tracks when every root has finished.
    pub fn start(&self, request: ScanRequest, events: &UnboundedSender<ScanEvent>) -> ScanProgress {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!("document search needs a tokio runtime; skipping scan");
            return ScanProgress::new(request.generation, 0);
        };

        let progress = ScanProgress::new(request.generation, self.options.roots.len());
        for (root, dir) in self.options.roots.iter().enumerate() {
            let scan = DirectoryScan {
                root,
                dir: dir.clone(),
                lister: Arc::clone(&self.lister),
                options: self.options.clone(),
                request: request.clone(),
                events: events.clone(),
                handle: handle.clone(),
            };
            handle.spawn_blocking(move || scan.run());
        }
        progress
    }
}

struct DirectoryScan {
    root: usize,
    dir: PathBuf,
    lister: Arc<dyn DirectoryLister>,
    options: DocumentSearchOptions,
    request: ScanRequest,
    events: UnboundedSender<ScanEvent>,
    handle: Handle,
}

impl DirectoryScan {
    fn run(self) {
        let generation = self.request.generation;
        let mut found = 0_usize;
        let mut content_reads = 0_usize;

        let outcome = self.lister.list_batches(
            &self.dir,
            self.options.batch_size,
            &mut |batch: Vec<DirEntryInfo>| {
                if !self.request.token.is_current(generation) {
                    return ControlFlow::Break(());
                }

                let mut matches = Vec::new();
                for entry in batch {
                    if found + matches.len() >= self.options.per_directory_cap {
                        break;
                    }
                    match self.classify(&entry) {
                        Candidate::Skip => {}
                        Candidate::Named(result) => matches.push(result),
                        Candidate::ContentCheck => {
                            content_reads += 1;
                            self.handle.spawn(read_content(
                                entry,
                                self.request.clone(),
                                self.options.max_content_bytes,
                                self.events.clone(),
                            ));
                        }
                    }
                }

                found += matches.len();
                if !matches.is_empty() {
                    let _ = self.events.send(ScanEvent::Batch {
                        generation,
                        root: self.root,
                        matches,
                    });
                }

                if found >= self.options.per_directory_cap {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );

        if let Err(error) = outcome {
            tracing::debug!(dir = %self.dir.display(), %error, "document root unavailable");
        }
        let _ = self.events.send(ScanEvent::DirectoryFinished {
            generation,
            root: self.root,
            content_reads,
        });
    }

    fn classify(&self, entry: &DirEntryInfo) -> Candidate {
        if entry.is_dir || entry.name.starts_with('.') {
            return Candidate::Skip;
        }
        let Some(extension) = extension_of(&entry.name) else {
            return Candidate::Skip;
        };
        if !DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
            return Candidate::Skip;
        }

        let score = score_document(&self.request.query, &entry.name);
        if score > 0.0 {
            return Candidate::Named(ScoredResult::document(
                &entry.name,
                &entry.path,
                icon_for_extension(&extension),
                score,
            ));
        }

        if self.options.content_search && PLAIN_TEXT_EXTENSIONS.contains(&extension.as_str()) {
            Candidate::ContentCheck
        } else {
            Candidate::Skip
        }
    }
}

enum Candidate {
    Skip,
    Named(ScoredResult),
    ContentCheck,
}

async fn read_content(
    entry: DirEntryInfo,
    request: ScanRequest,
    max_bytes: u64,
    events: UnboundedSender<ScanEvent>,
) {
    let matched = request.token.is_current(request.generation)
        && content_contains(&entry.path, &request.query, max_bytes).await;
    let result = matched.then(|| {
        let icon = extension_of(&entry.name)
            .map(|extension| icon_for_extension(&extension))
            .unwrap_or("text-x-generic");
        ScoredResult::document(&entry.name, &entry.path, icon, CONTENT_MATCH_SCORE)
    });
    let _ = events.send(ScanEvent::ContentRead {
        generation: request.generation,
        result,
    });
}

/// Oversized and unreadable files count as non-matches.
pub async fn content_contains(path: &Path, query: &str, max_bytes: u64) -> bool {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    if metadata.len() > max_bytes {
        return false;
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_lowercase().contains(query),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "content read failed");
            false
        }
    }
}

pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn icon_for_extension(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application-pdf",
        "doc" | "docx" | "odt" | "rtf" | "epub" => "x-office-document",
        "xls" | "xlsx" | "ods" | "csv" | "tsv" => "x-office-spreadsheet",
        "ppt" | "pptx" | "odp" => "x-office-presentation",
        "html" | "htm" | "xml" => "text-html",
        _ => "text-x-generic",
    }
}
