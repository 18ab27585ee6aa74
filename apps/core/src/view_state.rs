use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Overview,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTransition {
    EnterSearching,
    ReturnToOverview,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    visible: bool,
    mode: ViewMode,
}

impl ViewState {
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.mode = ViewMode::Overview;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_searching(&self) -> bool {
        self.mode == ViewMode::Searching
    }

    /// Switches mode as soon as the query becomes empty or non-empty; typing
    /// within one mode is not a transition.
    pub fn on_query(&mut self, query_is_empty: bool) -> Option<ViewTransition> {
        match (self.mode, query_is_empty) {
            (ViewMode::Overview, false) => {
                self.mode = ViewMode::Searching;
                Some(ViewTransition::EnterSearching)
            }
            (ViewMode::Searching, true) => {
                self.mode = ViewMode::Overview;
                Some(ViewTransition::ReturnToOverview)
            }
            _ => None,
        }
    }
}
