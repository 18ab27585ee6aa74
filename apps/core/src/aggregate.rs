use std::cmp::Ordering;

use crate::model::{Category, ResultKind, ScoredResult};

const GROUP_ORDER: [ResultKind; 3] = [
    ResultKind::Application,
    ResultKind::SettingsPanel,
    ResultKind::Document,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub kind: ResultKind,
    pub results: Vec<ScoredResult>,
}

impl ResultGroup {
    pub fn header(&self) -> &'static str {
        self.kind.header()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DisplayView {
    #[default]
    Empty,
    Flat(Vec<ScoredResult>),
    Grouped {
        best_match: ScoredResult,
        groups: Vec<ResultGroup>,
    },
}

impl DisplayView {
    /// Rows in on-screen order: best match first, then each group in turn.
    pub fn rows(&self) -> Vec<&ScoredResult> {
        match self {
            Self::Empty => Vec::new(),
            Self::Flat(results) => results.iter().collect(),
            Self::Grouped { best_match, groups } => std::iter::once(best_match)
                .chain(groups.iter().flat_map(|group| group.results.iter()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Flat(results) => results.len(),
            Self::Grouped { groups, .. } => {
                1 + groups.iter().map(|group| group.results.len()).sum::<usize>()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Merges the three result streams into the final ranked list: zero scores
/// and other categories dropped, score descending, name ascending on ties.
pub fn collect_and_display(
    apps: &[ScoredResult],
    settings: &[ScoredResult],
    documents: &[ScoredResult],
    category: Category,
    max_results: usize,
) -> Vec<ScoredResult> {
    let mut merged: Vec<ScoredResult> = apps
        .iter()
        .chain(settings)
        .chain(documents)
        .filter(|result| result.score > 0.0 && category.admits(result.kind()))
        .cloned()
        .collect();

    merged.sort_by(compare_results);
    merged.truncate(max_results);
    merged
}

fn compare_results(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name))
}

pub fn arrange(results: Vec<ScoredResult>, category: Category) -> DisplayView {
    if results.is_empty() {
        return DisplayView::Empty;
    }
    if category != Category::All {
        return DisplayView::Flat(results);
    }

    let mut remaining = results.into_iter();
    let Some(best_match) = remaining.next() else {
        return DisplayView::Empty;
    };
    let rest: Vec<ScoredResult> = remaining.collect();

    let groups = GROUP_ORDER
        .iter()
        .filter_map(|kind| {
            let members: Vec<ScoredResult> = rest
                .iter()
                .filter(|result| result.kind() == *kind)
                .cloned()
                .collect();
            (!members.is_empty()).then_some(ResultGroup {
                kind: *kind,
                results: members,
            })
        })
        .collect();

    DisplayView::Grouped { best_match, groups }
}
