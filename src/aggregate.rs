//! Folds per-review classifications into the output table and merit ledger.

use std::path::Path;

use anyhow::Context;
use tracing::{Instrument, info, info_span, warn};

use crate::backend::TextBackend;
use crate::classification::Classification;
use crate::classify::Classifier;
use crate::error::ClassifyError;
use crate::ledger::MeritLedger;
use crate::output::OutputTable;
use crate::reviews::{ReviewRecord, ReviewTable};
use crate::stats::RunStats;

/// Records one review's classification: appends its output row and applies
/// its merit adjustment to `hotel`.
///
/// A hotel missing from the ledger is not an error; the adjustment is skipped
/// and counted in `stats`.
pub fn fold_classification(
    output: &mut OutputTable,
    ledger: &mut MeritLedger,
    stats: &mut RunStats,
    hotel: &str,
    record: &ReviewRecord,
    classification: &Classification,
) {
    output.push(record, classification);
    stats.record(classification);

    let delta = classification.result().overall_sentiment.merit_delta();
    if ledger.adjust(hotel, delta).is_some() {
        stats.merit_delta += delta;
    } else {
        warn!(hotel, row = record.row, "Hotel not found in merit ledger, skipping adjustment");
        stats.merit_skipped += 1;
    }
}

/// Classifies every review in order and folds the results.
///
/// Reviews are processed strictly one after another. Nothing is written to
/// disk here; the caller persists `ledger` and the returned table once the
/// whole run has succeeded.
///
/// # Errors
///
/// The first backend failure aborts the run. `ledger` may already hold
/// adjustments from earlier reviews at that point and should be discarded.
pub async fn classify_reviews<B: TextBackend>(
    classifier: &Classifier<B>,
    reviews: &ReviewTable,
    ledger: &mut MeritLedger,
    hotel: &str,
    max_attempts: u32,
) -> Result<(OutputTable, RunStats), ClassifyError> {
    let mut output = OutputTable::new(reviews.headers().clone(), classifier.schema());
    let mut stats = RunStats::new(hotel);
    let total = reviews.len();

    for (i, record) in reviews.records().iter().enumerate() {
        let span = info_span!("review", row = record.row, n = i + 1, total);
        let classification = classifier
            .classify(&record.text, max_attempts)
            .instrument(span.clone())
            .await?;

        span.in_scope(|| {
            fold_classification(&mut output, ledger, &mut stats, hotel, record, &classification);
            info!(
                sentiment = %classification.result().overall_sentiment,
                rating = classification.result().rating,
                status = classification.status(),
                "Review classified"
            );
        });
    }

    let stats = stats.finish(ledger.merit(hotel));
    Ok((output, stats))
}

/// Persists a finished run: the output table to `output_path` and the ledger
/// to `ledger_path`.
///
/// Both files are written in full before either destination is replaced, so
/// a failed write leaves the previous files as they were.
pub fn persist_run(
    output: &OutputTable,
    output_path: &Path,
    ledger: &MeritLedger,
    ledger_path: &Path,
) -> anyhow::Result<()> {
    let staged_output = output
        .stage(output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    let staged_ledger = ledger
        .stage(ledger_path)
        .with_context(|| format!("failed to write {}", ledger_path.display()))?;

    staged_ledger
        .commit()
        .with_context(|| format!("failed to write {}", ledger_path.display()))?;
    staged_output
        .commit()
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!(
        output = %output_path.display(),
        ledger = %ledger_path.display(),
        rows = output.rows().len(),
        "Run persisted"
    );
    Ok(())
}
