use std::sync::Arc;
use std::time::Instant;

use crate::learning::LearningStore;
use crate::model::CorpusEntry;
use crate::search::{search_applications, AppScoring};
use crate::synonyms::{default_table, SynonymIndex};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.total_cmp(b));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_application_query_p95_under_budget() {
    let mut entries: Vec<Arc<CorpusEntry>> = (0..10_000)
        .map(|i| {
            Arc::new(CorpusEntry::new(
                &format!("org.example.Tool{i:05}.desktop"),
                &format!("Tool {i:05}"),
                "Generated utility",
                "application-x-executable",
            ))
        })
        .collect();
    entries.push(Arc::new(CorpusEntry::new(
        "org.mozilla.firefox.desktop",
        "Firefox",
        "Browse the web",
        "firefox",
    )));

    let synonyms = SynonymIndex::from_table(&default_table());
    let mut learning = LearningStore::in_memory();
    learning.record("firf", "org.mozilla.firefox.desktop");

    let run = |query: &str| {
        let scoring = AppScoring::new(query, &synonyms, &learning);
        search_applications(&entries, query, &scoring)
    };

    for _ in 0..10 {
        let _ = run("firf");
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(20);
        for _ in 0..20 {
            let start = Instant::now();
            let results = run("firf");
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert!(results.iter().any(|result| result.name == "Firefox"));
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.total_cmp(b));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 150.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 150.0ms); batches={batch_p95:?}",
    );
}
