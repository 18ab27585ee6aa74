use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Term → application names, plus the derived lowercase-name → terms view.
///
/// The reverse table is only ever rebuilt from the forward table, so every
/// reverse entry is backed by at least one forward entry listing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymIndex {
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: HashMap<String, BTreeSet<String>>,
}

impl SynonymIndex {
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Self {
        let mut index = Self::default();
        index.replace_table(table);
        index
    }

    pub fn replace_table(&mut self, table: &BTreeMap<String, Vec<String>>) {
        self.forward = table
            .iter()
            .filter_map(|(term, apps)| {
                let term = term.trim().to_lowercase();
                let apps: BTreeSet<String> = apps
                    .iter()
                    .map(|app| app.trim().to_string())
                    .filter(|app| !app.is_empty())
                    .collect();
                (!term.is_empty() && !apps.is_empty()).then_some((term, apps))
            })
            .collect();
        self.rebuild_reverse();
    }

    fn rebuild_reverse(&mut self) {
        self.reverse.clear();
        for (term, apps) in &self.forward {
            for app in apps {
                self.reverse
                    .entry(app.to_lowercase())
                    .or_default()
                    .insert(term.clone());
            }
        }
    }

    /// Lowercase application names reachable from any term equal to or
    /// starting with `query`.
    pub fn expand(&self, query: &str) -> HashSet<String> {
        if query.is_empty() {
            return HashSet::new();
        }

        self.forward
            .iter()
            .filter(|(term, _)| term.starts_with(query))
            .flat_map(|(_, apps)| apps.iter().map(|app| app.to_lowercase()))
            .collect()
    }

    pub fn terms_for(&self, app_name_lower: &str) -> Option<&BTreeSet<String>> {
        self.reverse.get(app_name_lower)
    }

    pub fn apps_for(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.forward.get(term)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

pub fn default_table() -> BTreeMap<String, Vec<String>> {
    let pairs: [(&str, &[&str]); 12] = [
        ("browser", &["Firefox", "Chromium", "Google Chrome", "Web", "Brave"]),
        ("web", &["Firefox", "Chromium", "Google Chrome", "Web"]),
        ("internet", &["Firefox", "Chromium", "Google Chrome"]),
        ("editor", &["Text Editor", "gedit", "Visual Studio Code", "Vim"]),
        ("notepad", &["Text Editor", "gedit"]),
        ("terminal", &["Console", "Terminal", "Ptyxis", "Konsole"]),
        ("shell", &["Console", "Terminal", "Ptyxis"]),
        ("mail", &["Thunderbird", "Evolution", "Geary"]),
        ("email", &["Thunderbird", "Evolution", "Geary"]),
        ("music", &["Rhythmbox", "Spotify", "Lollypop"]),
        ("photo", &["GIMP", "Shotwell", "Image Viewer"]),
        ("calculator", &["Calculator", "Qalculate!"]),
    ];

    pairs
        .into_iter()
        .map(|(term, apps)| {
            (
                term.to_string(),
                apps.iter().map(|app| app.to_string()).collect(),
            )
        })
        .collect()
}
