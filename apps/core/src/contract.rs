use serde::{Deserialize, Serialize};

use crate::aggregate::DisplayView;
use crate::controller::{OverviewTile, ResultsUpdate};
use crate::model::{Category, ResultKind, ScoredResult};
use crate::view_state::ViewMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultDto {
    pub id: String,
    pub kind: ResultKind,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupDto {
    pub header: String,
    pub results: Vec<ResultDto>,
}

/// One display pass. `results` is always the full list in display order;
/// `best_match` and `groups` are only set for the grouped layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsPayload {
    pub generation: u64,
    pub query: String,
    pub category: Category,
    pub loading_more: bool,
    pub results: Vec<ResultDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<ResultDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum UiRequest {
    SetQuery { text: String },
    SetCategory { category: Category },
    ActivateSelected { index: usize },
    SetVisible { visible: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum UiResponse {
    Accepted,
    Activated { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    ResultsChanged(ResultsPayload),
    Overview { tiles: Vec<OverviewTile> },
    ModeChanged { mode: ViewMode },
    IconLoaded { row: usize, icon: String },
}

impl From<&ScoredResult> for ResultDto {
    fn from(value: &ScoredResult) -> Self {
        Self {
            id: value.result_id(),
            kind: value.kind(),
            name: value.name.clone(),
            description: value.description.clone(),
            icon: value.icon.clone(),
            score: value.score,
        }
    }
}

impl From<&ResultsUpdate> for ResultsPayload {
    fn from(value: &ResultsUpdate) -> Self {
        let (best_match, groups) = match &value.view {
            DisplayView::Grouped { best_match, groups } => (
                Some(ResultDto::from(best_match)),
                groups
                    .iter()
                    .map(|group| GroupDto {
                        header: group.header().to_string(),
                        results: group.results.iter().map(ResultDto::from).collect(),
                    })
                    .collect(),
            ),
            DisplayView::Empty | DisplayView::Flat(_) => (None, Vec::new()),
        };

        Self {
            generation: value.generation,
            query: value.query.clone(),
            category: value.category,
            loading_more: value.loading_more,
            results: value.view.rows().into_iter().map(ResultDto::from).collect(),
            best_match,
            groups,
        }
    }
}
