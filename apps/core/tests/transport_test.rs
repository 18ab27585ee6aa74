use std::path::Path;
use std::sync::{Arc, Mutex};

use lumen_core::action_executor::{Activator, LaunchError};
use lumen_core::config::Config;
use lumen_core::contract::UiResponse;
use lumen_core::controller::{Collaborators, DisplaySink, OverviewTile, QueryController, ResultsUpdate};
use lumen_core::discovery::StaticCatalog;
use lumen_core::documents::WalkDirLister;
use lumen_core::learning::LearningStore;
use lumen_core::loader::IconSlot;
use lumen_core::model::{Category, CorpusEntry};
use lumen_core::transport::{handle_json, ErrorCode, TransportResponse};

struct Slot;

impl IconSlot for Slot {
    fn assign_icon(&self, _icon: &str) {}
}

#[derive(Default)]
struct Counter {
    results: usize,
}

impl DisplaySink for Counter {
    type Slot = Slot;

    fn show_overview(&mut self, tiles: &[OverviewTile]) -> Vec<Arc<Slot>> {
        tiles.iter().map(|_| Arc::new(Slot)).collect()
    }

    fn show_results(&mut self, update: &ResultsUpdate) -> Vec<Arc<Slot>> {
        self.results += 1;
        (0..update.view.len()).map(|_| Arc::new(Slot)).collect()
    }
}

#[derive(Clone, Default)]
struct Launches {
    fail: bool,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Launches {
    fn record(&self, target: String) -> Result<(), LaunchError> {
        if self.fail {
            return Err(LaunchError::Spawn {
                program: "gtk-launch".to_string(),
                message: "not found".to_string(),
            });
        }
        self.seen.lock().unwrap().push(target);
        Ok(())
    }
}

impl Activator for Launches {
    fn activate_application(&self, entry: &CorpusEntry) -> Result<(), LaunchError> {
        self.record(entry.id.clone())
    }

    fn open_settings_panel(&self, panel: &str) -> Result<(), LaunchError> {
        self.record(panel.to_string())
    }

    fn open_file(&self, path: &Path) -> Result<(), LaunchError> {
        self.record(path.display().to_string())
    }
}

fn controller(launches: Launches) -> QueryController<Counter> {
    let config = Config {
        searched_folders: Vec::new(),
        ..Config::default()
    };
    let collaborators = Collaborators {
        catalog: Box::new(StaticCatalog::deterministic_fixture()),
        lister: Arc::new(WalkDirLister),
        activator: Box::new(launches),
        learning: LearningStore::in_memory(),
    };
    let mut controller = QueryController::new(config, collaborators, Counter::default());
    controller.set_visible(true);
    controller
}

fn decode(line: &str) -> TransportResponse {
    serde_json::from_str(line).expect("transport output should be valid json")
}

fn error_code(line: &str) -> ErrorCode {
    match decode(line) {
        TransportResponse::Err { error } => error.code,
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn malformed_payload_reports_invalid_json() {
    let mut controller = controller(Launches::default());
    assert_eq!(error_code(&handle_json(&mut controller, "{not json")), ErrorCode::InvalidJson);
    assert_eq!(
        error_code(&handle_json(&mut controller, r#"{"kind":"reboot"}"#)),
        ErrorCode::InvalidJson
    );
}

#[test]
fn set_query_is_accepted_and_debounced() {
    let mut controller = controller(Launches::default());
    let line = handle_json(
        &mut controller,
        r#"{"kind":"set_query","payload":{"text":"fire"}}"#,
    );

    assert_eq!(
        decode(&line),
        TransportResponse::Ok {
            response: UiResponse::Accepted
        }
    );
    assert_eq!(controller.query().text, "fire");
    assert!(controller.has_pending_debounce());
    assert_eq!(controller.display().results, 0);
}

#[test]
fn activation_without_results_reports_nothing_selected() {
    let mut controller = controller(Launches::default());
    let line = handle_json(
        &mut controller,
        r#"{"kind":"activate_selected","payload":{"index":0}}"#,
    );
    assert_eq!(error_code(&line), ErrorCode::NothingSelected);
}

#[test]
fn activation_launches_displayed_row() {
    let launches = Launches::default();
    let mut controller = controller(launches.clone());
    handle_json(
        &mut controller,
        r#"{"kind":"set_query","payload":{"text":"firefox"}}"#,
    );
    assert!(controller.flush_debounce());

    let line = handle_json(
        &mut controller,
        r#"{"kind":"activate_selected","payload":{"index":0}}"#,
    );

    assert_eq!(
        decode(&line),
        TransportResponse::Ok {
            response: UiResponse::Activated {
                name: "Firefox".to_string()
            }
        }
    );
    assert_eq!(
        launches.seen.lock().unwrap().as_slice(),
        ["org.mozilla.firefox.desktop".to_string()]
    );
    assert_eq!(
        error_code(&handle_json(
            &mut controller,
            r#"{"kind":"activate_selected","payload":{"index":99}}"#,
        )),
        ErrorCode::OutOfRange
    );
}

#[test]
fn launch_failure_maps_to_launch_code() {
    let mut controller = controller(Launches {
        fail: true,
        ..Launches::default()
    });
    handle_json(
        &mut controller,
        r#"{"kind":"set_query","payload":{"text":"console"}}"#,
    );
    controller.flush_debounce();

    let line = handle_json(
        &mut controller,
        r#"{"kind":"activate_selected","payload":{"index":0}}"#,
    );
    assert_eq!(error_code(&line), ErrorCode::Launch);
}

#[test]
fn category_request_switches_filter() {
    let mut controller = controller(Launches::default());
    handle_json(
        &mut controller,
        r#"{"kind":"set_category","payload":{"category":"settings"}}"#,
    );
    assert_eq!(controller.query().category, Category::Settings);
}
