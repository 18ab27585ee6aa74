use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::action_executor::SystemActivator;
use crate::config::{self, Config, ConfigError};
use crate::contract::{ResultDto, ResultsPayload, UiEvent};
use crate::controller::{Collaborators, DisplaySink, OverviewTile, QueryController, ResultsUpdate};
use crate::discovery::DesktopEntryCatalog;
use crate::documents::WalkDirLister;
use crate::learning::LearningStore;
use crate::loader::IconSlot;
use crate::model::Category;
use crate::store::BlobStore;
use crate::transport;
use crate::view_state::ViewMode;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown category: {0}")]
    InvalidCategory(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// 2 for bad arguments or configuration, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InvalidCategory(_) => 2,
            Self::Io(_) => 1,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lumen-core")]
#[command(about = "Launcher search engine: applications, settings panels and documents")]
pub struct Cli {
    /// Config file (.json5 or .toml); defaults to the app data directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one query to completion and print the results.
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Read JSON-line requests on stdin and write responses and events on stdout.
    Serve,
}

#[derive(Debug, Default)]
pub struct RowSlot {
    row: usize,
    announce: bool,
    icon: Mutex<Option<String>>,
}

impl RowSlot {
    pub fn icon(&self) -> Option<String> {
        self.icon.lock().ok().and_then(|icon| icon.clone())
    }
}

impl IconSlot for RowSlot {
    fn assign_icon(&self, icon: &str) {
        if let Ok(mut slot) = self.icon.lock() {
            *slot = Some(icon.to_string());
        }
        if self.announce {
            emit(&UiEvent::IconLoaded {
                row: self.row,
                icon: icon.to_string(),
            });
        }
    }
}

/// Display sink for the command-line host. In announce mode every display
/// pass is written to stdout as an event line.
#[derive(Debug, Default)]
pub struct LineSink {
    announce: bool,
    last: Option<ResultsUpdate>,
    overview: Vec<OverviewTile>,
    overview_slots: Vec<Arc<RowSlot>>,
    result_slots: Vec<Arc<RowSlot>>,
}

impl LineSink {
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn announcing() -> Self {
        Self {
            announce: true,
            ..Self::default()
        }
    }

    pub fn last_results(&self) -> Option<&ResultsUpdate> {
        self.last.as_ref()
    }

    pub fn overview(&self) -> &[OverviewTile] {
        &self.overview
    }

    pub fn result_slots(&self) -> &[Arc<RowSlot>] {
        &self.result_slots
    }

    fn fresh_slots(&self, rows: usize) -> Vec<Arc<RowSlot>> {
        (0..rows)
            .map(|row| {
                Arc::new(RowSlot {
                    row,
                    announce: self.announce,
                    icon: Mutex::new(None),
                })
            })
            .collect()
    }
}

impl DisplaySink for LineSink {
    type Slot = RowSlot;

    fn mode_changed(&mut self, mode: ViewMode) {
        if self.announce {
            emit(&UiEvent::ModeChanged { mode });
        }
    }

    fn show_overview(&mut self, tiles: &[OverviewTile]) -> Vec<Arc<RowSlot>> {
        self.overview = tiles.to_vec();
        if self.announce {
            emit(&UiEvent::Overview {
                tiles: tiles.to_vec(),
            });
        }
        // Overview slots outlive result passes so a paused queue can resume.
        self.overview_slots = self.fresh_slots(tiles.len());
        self.overview_slots.clone()
    }

    fn show_results(&mut self, update: &ResultsUpdate) -> Vec<Arc<RowSlot>> {
        if self.announce {
            emit(&UiEvent::ResultsChanged(ResultsPayload::from(update)));
        }
        self.last = Some(update.clone());
        self.result_slots = self.fresh_slots(update.view.len());
        self.result_slots.clone()
    }
}

fn emit(event: &UiEvent) {
    write_line(&transport::encode(event));
}

fn write_line(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}

pub fn load_config(path: Option<PathBuf>) -> Result<Config, RuntimeError> {
    let config = config::load(path.as_deref())?;
    tracing::info!(
        config_path = %config.config_path.display(),
        learning_db_path = %config.learning_db_path.display(),
        "config loaded"
    );
    Ok(config)
}

/// Wires the desktop collaborators. A learning database that cannot be
/// opened leaves learning in memory for this session.
pub fn build_controller<D: DisplaySink>(config: Config, display: D) -> QueryController<D> {
    let learning = match BlobStore::open(&config.learning_db_path) {
        Ok(store) => LearningStore::open(Box::new(store)),
        Err(error) => {
            tracing::warn!(%error, "learning database unavailable; keeping learning in memory");
            LearningStore::in_memory()
        }
    };

    let collaborators = Collaborators {
        catalog: Box::new(DesktopEntryCatalog::from_environment()),
        lister: Arc::new(WalkDirLister),
        activator: Box::new(SystemActivator),
        learning,
    };
    QueryController::new(config, collaborators, display)
}

pub async fn run(cli: Cli) -> Result<(), RuntimeError> {
    let config = load_config(cli.config)?;
    match cli.command {
        Command::Search {
            query,
            category,
            json,
        } => {
            let category = category
                .map(|raw| Category::parse(&raw).ok_or(RuntimeError::InvalidCategory(raw)))
                .transpose()?;
            let mut controller = build_controller(config, LineSink::quiet());
            let payload = search_once(&mut controller, &query, category).await;
            if json {
                write_line(&transport::encode(&payload));
            } else {
                print!("{}", render_text(&payload));
            }
            Ok(())
        }
        Command::Serve => serve(build_controller(config, LineSink::announcing())).await,
    }
}

/// Runs one query through the debounce, every scan, and every icon pass.
pub async fn search_once<D>(
    controller: &mut QueryController<D>,
    query: &str,
    category: Option<Category>,
) -> ResultsPayload
where
    D: DisplaySink,
{
    controller.set_visible(true);
    if let Some(category) = category {
        controller.set_category(category);
    }
    controller.set_query(query);
    controller.flush_debounce();
    controller.run_until_idle().await;

    let update = ResultsUpdate {
        generation: controller.query().generation,
        query: controller.query().text.clone(),
        category: controller.query().category,
        view: controller.displayed().clone(),
        loading_more: controller.is_loading_more(),
    };
    ResultsPayload::from(&update)
}

pub fn render_text(payload: &ResultsPayload) -> String {
    if payload.results.is_empty() {
        return format!("No matches for '{}'.\n", payload.query);
    }

    let mut out = String::new();
    if let Some(best) = &payload.best_match {
        out.push_str("Best match\n");
        push_row(&mut out, best);
        for group in &payload.groups {
            out.push_str(&format!("{}\n", group.header));
            group.results.iter().for_each(|row| push_row(&mut out, row));
        }
        return out;
    }

    let mut header = None;
    for result in &payload.results {
        let current = result.kind.header();
        if header != Some(current) {
            out.push_str(&format!("{current}\n"));
            header = Some(current);
        }
        push_row(&mut out, result);
    }
    out
}

fn push_row(out: &mut String, result: &ResultDto) {
    if result.description.is_empty() {
        out.push_str(&format!("  [{:6.1}] {}\n", result.score, result.name));
    } else {
        out.push_str(&format!(
            "  [{:6.1}] {}  {}\n",
            result.score, result.name, result.description
        ));
    }
}

async fn serve<D: DisplaySink>(mut controller: QueryController<D>) -> Result<(), RuntimeError> {
    tracing::info!("serving JSON lines on stdin");
    controller.set_visible(true);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                write_line(&transport::handle_json(&mut controller, line));
            }
            _ = controller.step(), if !controller.is_idle() => {}
        }
    }

    tracing::info!("stdin closed; shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render_text, Cli, Command, RuntimeError};
    use crate::contract::{GroupDto, ResultDto, ResultsPayload};
    use crate::model::{Category, ResultKind};
    use clap::Parser;

    fn dto(kind: ResultKind, name: &str, score: f64) -> ResultDto {
        ResultDto {
            id: name.to_ascii_lowercase(),
            kind,
            name: name.to_string(),
            description: String::new(),
            icon: String::new(),
            score,
        }
    }

    #[test]
    fn search_arguments_parse() {
        let cli = Cli::try_parse_from([
            "lumen-core",
            "--config",
            "/tmp/lumen.toml",
            "search",
            "fire",
            "--category",
            "apps",
            "--json",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/lumen.toml")));
        match cli.command {
            Command::Search {
                query,
                category,
                json,
            } => {
                assert_eq!(query, "fire");
                assert_eq!(category.as_deref(), Some("apps"));
                assert!(json);
            }
            Command::Serve => panic!("expected search"),
        }
    }

    #[test]
    fn serve_takes_no_query() {
        let cli = Cli::try_parse_from(["lumen-core", "serve"]).expect("serve should parse");
        assert!(matches!(cli.command, Command::Serve));
        assert!(Cli::try_parse_from(["lumen-core", "search"]).is_err());
    }

    #[test]
    fn text_output_prints_headers_once_per_kind() {
        let payload = ResultsPayload {
            generation: 1,
            query: "fi".to_string(),
            category: Category::All,
            loading_more: false,
            results: vec![
                dto(ResultKind::Application, "Firefox", 85.0),
                dto(ResultKind::Application, "Files", 85.0),
                dto(ResultKind::SettingsPanel, "Firewall", 75.0),
            ],
            best_match: None,
            groups: Vec::new(),
        };

        let text = render_text(&payload);
        assert_eq!(text.matches("Applications").count(), 1);
        assert_eq!(text.matches("Settings").count(), 1);
        assert!(text.contains("Firefox"));
    }

    #[test]
    fn grouped_output_leads_with_best_match() {
        let best = dto(ResultKind::SettingsPanel, "Firewall", 95.0);
        let app = dto(ResultKind::Application, "Firefox", 85.0);
        let payload = ResultsPayload {
            generation: 2,
            query: "fire".to_string(),
            category: Category::All,
            loading_more: false,
            results: vec![best.clone(), app.clone()],
            best_match: Some(best),
            groups: vec![GroupDto {
                header: "Applications".to_string(),
                results: vec![app],
            }],
        };

        let text = render_text(&payload);
        assert!(text.starts_with("Best match\n"));
        let best_at = text.find("Firewall").expect("best match should print");
        let app_at = text.find("Firefox").expect("group row should print");
        assert!(best_at < app_at);
    }

    #[test]
    fn empty_results_print_hint() {
        let payload = ResultsPayload {
            generation: 1,
            query: "zzz".to_string(),
            category: Category::All,
            loading_more: false,
            results: Vec::new(),
            best_match: None,
            groups: Vec::new(),
        };
        assert_eq!(render_text(&payload), "No matches for 'zzz'.\n");
    }

    #[test]
    fn exit_codes_split_usage_from_runtime_failures() {
        assert_eq!(RuntimeError::InvalidCategory("x".into()).exit_code(), 2);
        assert_eq!(
            RuntimeError::Io(std::io::Error::other("boom")).exit_code(),
            1
        );
    }
}
