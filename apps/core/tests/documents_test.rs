use std::path::{Path, PathBuf};
use std::time::Duration;
use std::sync::{Arc, Mutex};

use lumen_core::action_executor::SystemActivator;
use lumen_core::config::Config;
use lumen_core::controller::{Collaborators, DisplaySink, OverviewTile, QueryController, ResultsUpdate};
use lumen_core::discovery::StaticCatalog;
use lumen_core::documents::{
    content_contains, DocumentSearch, DocumentSearchOptions, ScanEvent, ScanRequest, WalkDirLister,
};
use lumen_core::learning::LearningStore;
use lumen_core::loader::IconSlot;
use lumen_core::model::{GenerationToken, ResultKind, ScoredResult};
use tokio::sync::mpsc::unbounded_channel;

fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("fixture file should be written");
    path
}

fn options(roots: Vec<PathBuf>) -> DocumentSearchOptions {
    DocumentSearchOptions {
        roots,
        content_search: false,
        max_content_bytes: 1024,
        per_directory_cap: 5,
        batch_size: 3,
        min_query_len: 2,
    }
}

async fn scan(search: &DocumentSearch, query: &str, token: &GenerationToken, generation: u64) -> Vec<ScanEvent> {
    let (tx, mut rx) = unbounded_channel();
    let request = ScanRequest {
        query: query.to_string(),
        generation,
        token: token.clone(),
    };
    let mut progress = search.start(request, &tx);
    let mut events = Vec::new();
    while !progress.is_settled() {
        let event = rx.recv().await.expect("scan should keep reporting");
        match &event {
            ScanEvent::DirectoryFinished {
                root, content_reads, ..
            } => {
                progress.finish_directory(*root, *content_reads);
            }
            ScanEvent::ContentRead { .. } => progress.content_read_done(),
            ScanEvent::Batch { .. } => {}
        }
        events.push(event);
    }
    events
}

fn matches(events: &[ScanEvent]) -> Vec<ScoredResult> {
    let mut found: Vec<ScoredResult> = events
        .iter()
        .flat_map(|event| match event {
            ScanEvent::Batch { matches, .. } => matches.clone(),
            ScanEvent::ContentRead {
                result: Some(result),
                ..
            } => vec![result.clone()],
            _ => Vec::new(),
        })
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

#[tokio::test]
async fn name_matches_skip_hidden_directories_and_unknown_types() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "report.txt", b"");
    touch(dir.path(), "Report-2024.pdf", b"");
    touch(dir.path(), ".report.txt", b"");
    touch(dir.path(), "report.exe", b"");
    touch(dir.path(), "holiday.png", b"");
    std::fs::create_dir(dir.path().join("report")).expect("subdir should be created");

    let search = DocumentSearch::new(Arc::new(WalkDirLister), options(vec![dir.path().to_path_buf()]));
    let token = GenerationToken::default();
    let generation = token.advance();
    let found = matches(&scan(&search, "report", &token, generation).await);

    let names: Vec<&str> = found.iter().map(|result| result.name.as_str()).collect();
    assert_eq!(names, vec!["Report-2024.pdf", "report.txt"]);
    assert_eq!(found[0].score, 70.0);
    assert_eq!(found[1].score, 90.0);
    assert!(found.iter().all(|result| result.kind() == ResultKind::Document));
}

#[tokio::test]
async fn each_directory_stops_at_its_cap() {
    let first = tempfile::tempdir().expect("temp dir should be created");
    let second = tempfile::tempdir().expect("temp dir should be created");
    for index in 0..8 {
        touch(first.path(), &format!("notes-{index}.md"), b"");
        touch(second.path(), &format!("notes-{index}.txt"), b"");
    }

    let search = DocumentSearch::new(
        Arc::new(WalkDirLister),
        options(vec![first.path().to_path_buf(), second.path().to_path_buf()]),
    );
    let token = GenerationToken::default();
    let generation = token.advance();
    let events = scan(&search, "notes", &token, generation).await;

    let per_root = |root_index: usize| -> usize {
        events
            .iter()
            .map(|event| match event {
                ScanEvent::Batch { root, matches, .. } if *root == root_index => matches.len(),
                _ => 0,
            })
            .sum()
    };
    assert_eq!(per_root(0), 5);
    assert_eq!(per_root(1), 5);
}

#[tokio::test]
async fn missing_root_still_finishes() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let missing = dir.path().join("does-not-exist");

    let search = DocumentSearch::new(Arc::new(WalkDirLister), options(vec![missing]));
    let token = GenerationToken::default();
    let generation = token.advance();
    let events = scan(&search, "report", &token, generation).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ScanEvent::DirectoryFinished { root: 0, content_reads: 0, .. }
    ));
}

#[tokio::test]
async fn content_search_reads_small_plain_text_files_only() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "notes.md", b"Quarterly BUDGET review");
    touch(dir.path(), "huge.txt", &b"budget ".repeat(300));
    touch(dir.path(), "slides.pdf", b"budget");

    let mut opts = options(vec![dir.path().to_path_buf()]);
    opts.content_search = true;
    opts.max_content_bytes = 64;
    let search = DocumentSearch::new(Arc::new(WalkDirLister), opts);
    let token = GenerationToken::default();
    let generation = token.advance();
    let found = matches(&scan(&search, "budget", &token, generation).await);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "notes.md");
    assert_eq!(found[0].score, 25.0);
}

#[tokio::test]
async fn disabled_content_search_schedules_no_reads() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "notes.md", b"Quarterly budget review");

    let search = DocumentSearch::new(Arc::new(WalkDirLister), options(vec![dir.path().to_path_buf()]));
    let token = GenerationToken::default();
    let generation = token.advance();
    let events = scan(&search, "budget", &token, generation).await;

    assert!(events
        .iter()
        .all(|event| !matches!(event, ScanEvent::ContentRead { .. })));
}

#[tokio::test]
async fn superseded_generation_abandons_listing() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "report.txt", b"");

    let search = DocumentSearch::new(Arc::new(WalkDirLister), options(vec![dir.path().to_path_buf()]));
    let token = GenerationToken::default();
    let generation = token.advance();
    token.advance();
    let events = scan(&search, "report", &token, generation).await;

    assert!(matches(&events).is_empty());
    assert!(events.iter().all(|event| event.generation() == generation));
}

#[tokio::test]
async fn content_check_handles_limits_and_missing_files() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = touch(dir.path(), "todo.txt", b"Call the Plumber");

    assert!(content_contains(&path, "plumber", 1024).await);
    assert!(!content_contains(&path, "plumber", 4).await);
    assert!(!content_contains(&path, "electrician", 1024).await);
    assert!(!content_contains(&dir.path().join("missing.txt"), "plumber", 1024).await);
}

#[derive(Default)]
struct Slot(Mutex<Option<String>>);

impl IconSlot for Slot {
    fn assign_icon(&self, icon: &str) {
        *self.0.lock().unwrap() = Some(icon.to_string());
    }
}

#[derive(Default)]
struct Updates(Vec<ResultsUpdate>);

impl DisplaySink for Updates {
    type Slot = Slot;

    fn show_overview(&mut self, tiles: &[OverviewTile]) -> Vec<Arc<Slot>> {
        tiles.iter().map(|_| Arc::new(Slot::default())).collect()
    }

    fn show_results(&mut self, update: &ResultsUpdate) -> Vec<Arc<Slot>> {
        self.0.push(update.clone());
        (0..update.view.len()).map(|_| Arc::new(Slot::default())).collect()
    }
}

fn document_controller(root: &Path) -> QueryController<Updates> {
    controller_for(Config {
        searched_folders: vec![root.to_path_buf()],
        ..Config::default()
    })
}

fn content_controller(root: &Path) -> QueryController<Updates> {
    controller_for(Config {
        searched_folders: vec![root.to_path_buf()],
        content_search_enabled: true,
        ..Config::default()
    })
}

fn controller_for(config: Config) -> QueryController<Updates> {
    let collaborators = Collaborators {
        catalog: Box::new(StaticCatalog::deterministic_fixture()),
        lister: Arc::new(WalkDirLister),
        activator: Box::new(SystemActivator),
        learning: LearningStore::in_memory(),
    };
    let mut controller = QueryController::new(config, collaborators, Updates::default());
    controller.set_visible(true);
    controller
}

fn has_documents(update: &ResultsUpdate) -> bool {
    update
        .view
        .rows()
        .iter()
        .any(|row| row.kind() == ResultKind::Document)
}

#[tokio::test]
async fn documents_arrive_after_application_pass() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "report.txt", b"");
    let mut controller = document_controller(dir.path());

    controller.set_query("report");
    controller.flush_debounce();
    controller.run_until_idle().await;

    let updates = &controller.display().0;
    assert!(updates.len() >= 2);
    assert!(updates[0].loading_more);
    assert!(!has_documents(&updates[0]));

    let last = updates.last().expect("final pass");
    assert!(!last.loading_more);
    assert!(last.view.rows().iter().any(|row| row.name == "report.txt"));
    assert!(!controller.is_loading_more());
}

#[tokio::test]
async fn superseded_scan_results_are_never_displayed() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "report.txt", b"");
    let mut controller = document_controller(dir.path());

    controller.set_query("report");
    controller.flush_debounce();
    let old = controller.query().generation;
    controller.set_query("zzzz");
    controller.flush_debounce();
    controller.run_until_idle().await;

    let updates = &controller.display().0;
    assert!(updates
        .iter()
        .filter(|update| update.generation == old)
        .all(|update| !has_documents(update)));
    assert!(!controller
        .displayed()
        .rows()
        .iter()
        .any(|row| row.name == "report.txt"));
}

#[tokio::test]
async fn content_match_is_displayed_on_the_settling_pass() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "notes.md", b"Quarterly budget review");
    let mut controller = content_controller(dir.path());

    controller.set_query("budget");
    controller.flush_debounce();
    controller.run_until_idle().await;

    let updates = &controller.display().0;
    let (last, earlier) = updates.split_last().expect("at least one pass");
    assert!(!earlier.is_empty());
    assert!(earlier.iter().all(|update| update.loading_more));
    assert!(!last.loading_more);

    let rows = last.view.rows();
    let notes = rows
        .iter()
        .find(|row| row.name == "notes.md")
        .expect("content hit should be displayed");
    assert_eq!(notes.score, 25.0);
    assert_eq!(notes.kind(), ResultKind::Document);
}

#[tokio::test]
async fn superseded_content_reads_never_reach_the_display() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "notes.md", b"Quarterly budget review");
    let mut controller = content_controller(dir.path());

    controller.set_query("budget");
    controller.flush_debounce();
    let superseded = controller.query().generation;
    controller.set_query("zzzz");
    controller.flush_debounce();
    controller.run_until_idle().await;

    let updates = &controller.display().0;
    assert!(updates
        .iter()
        .filter(|update| update.generation == superseded)
        .all(|update| !has_documents(update)));
    assert!(controller.displayed().rows().is_empty());
}

#[tokio::test]
async fn stale_content_read_and_directory_events_are_ignored() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut controller = content_controller(dir.path());

    controller.set_query("budget");
    controller.flush_debounce();
    let stale = controller.query().generation;
    controller.set_query("budgets");
    controller.flush_debounce();
    let passes = controller.display().0.len();

    controller.handle_scan_event(ScanEvent::ContentRead {
        generation: stale,
        result: Some(ScoredResult::document(
            "notes.md",
            &dir.path().join("notes.md"),
            "text-x-generic",
            25.0,
        )),
    });
    controller.handle_scan_event(ScanEvent::DirectoryFinished {
        generation: stale,
        root: 0,
        content_reads: 0,
    });

    assert_eq!(controller.display().0.len(), passes);
    assert!(!has_documents(&controller.display().0[passes - 1]));
    assert!(controller.is_loading_more());
}

#[tokio::test]
async fn superseded_scan_events_do_not_pile_up_without_a_new_scan() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    touch(dir.path(), "report.txt", b"");
    let mut controller = document_controller(dir.path());

    controller.set_query("report");
    controller.flush_debounce();
    // The scan reports its batch and its completion; nothing consumes them yet.
    tokio::time::timeout(Duration::from_secs(10), async {
        while controller.queued_scan_events() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("scan should report");

    // One character is below the document threshold, so no new scan starts.
    controller.set_query("r");
    controller.flush_debounce();

    assert_eq!(controller.queued_scan_events(), 0);
    assert!(!controller.is_loading_more());
    assert!(controller.displayed().rows().iter().all(|row| row.kind() != ResultKind::Document));
}
