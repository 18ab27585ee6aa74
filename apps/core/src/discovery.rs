use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Raw catalog record, before it is validated into a corpus entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogApp {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl CatalogApp {
    pub fn new(id: &str, name: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }
    }
}

pub trait CatalogProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn list_applications(&self) -> Result<Vec<CatalogApp>, ProviderError>;
}

pub struct StaticCatalog {
    apps: Vec<CatalogApp>,
}

impl StaticCatalog {
    pub fn from_apps(apps: Vec<CatalogApp>) -> Self {
        Self { apps }
    }

    pub fn empty() -> Self {
        Self { apps: Vec::new() }
    }

    pub fn deterministic_fixture() -> Self {
        Self {
            apps: vec![
                CatalogApp::new(
                    "org.mozilla.firefox.desktop",
                    "Firefox",
                    "Browse the World Wide Web",
                    "org.mozilla.firefox",
                ),
                CatalogApp::new(
                    "org.gnome.TextEditor.desktop",
                    "Text Editor",
                    "Edit text files",
                    "org.gnome.TextEditor",
                ),
                CatalogApp::new(
                    "org.gnome.Console.desktop",
                    "Console",
                    "Use the command line",
                    "org.gnome.Console",
                ),
                CatalogApp::new(
                    "org.gnome.Calculator.desktop",
                    "Calculator",
                    "Perform arithmetic, scientific or financial calculations",
                    "org.gnome.Calculator",
                ),
            ],
        }
    }
}

impl CatalogProvider for StaticCatalog {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    fn list_applications(&self) -> Result<Vec<CatalogApp>, ProviderError> {
        Ok(self.apps.clone())
    }
}

/// Reads freedesktop `.desktop` files from the XDG application directories.
pub struct DesktopEntryCatalog {
    dirs: Vec<PathBuf>,
}

impl DesktopEntryCatalog {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn from_environment() -> Self {
        let mut dirs = Vec::new();
        if let Some(data_home) = std::env::var_os("XDG_DATA_HOME") {
            dirs.push(PathBuf::from(data_home).join("applications"));
        } else if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/applications"));
        }

        let data_dirs = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs.extend(
            data_dirs
                .split(':')
                .filter(|dir| !dir.is_empty())
                .map(|dir| PathBuf::from(dir).join("applications")),
        );

        Self { dirs }
    }
}

impl CatalogProvider for DesktopEntryCatalog {
    fn provider_name(&self) -> &'static str {
        "desktop-entries"
    }

    fn list_applications(&self) -> Result<Vec<CatalogApp>, ProviderError> {
        let mut seen = HashSet::new();
        let mut apps = Vec::new();

        for dir in self.dirs.iter().filter(|dir| dir.is_dir()) {
            for entry in WalkDir::new(dir)
                .max_depth(2)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|ext| ext.to_str()) != Some("desktop")
                {
                    continue;
                }
                let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if !seen.insert(id.clone()) {
                    continue;
                }
                match read_desktop_entry(path, &id) {
                    Some(app) => apps.push(app),
                    None => tracing::debug!(path = %path.display(), "skipping desktop entry"),
                }
            }
        }

        Ok(apps)
    }
}

fn read_desktop_entry(path: &Path, id: &str) -> Option<CatalogApp> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_desktop_entry(&contents, id)
}

pub fn parse_desktop_entry(contents: &str, id: &str) -> Option<CatalogApp> {
    let mut in_main_group = false;
    let mut name = None;
    let mut description = String::new();
    let mut icon = String::new();
    let mut is_application = true;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Comment" => description = value.to_string(),
            "Icon" => icon = value.to_string(),
            "Type" => is_application = value == "Application",
            "NoDisplay" | "Hidden" if value.eq_ignore_ascii_case("true") => return None,
            _ => {}
        }
    }

    if !is_application {
        return None;
    }
    let name = name.filter(|name| !name.is_empty())?;
    Some(CatalogApp {
        id: id.to_string(),
        name,
        description,
        icon,
    })
}
