//! Aggregation of backtest and evaluation records into rate tables.

use crate::types::{
    BacktestRecord, BacktestReport, BacktestRun, EvaluationRecord, EvaluationReport,
    EvaluationResult, EvaluationSummary, GroupStats, GroupTable,
};
use std::fmt::Write;

/// Symbols listed in the rendered report.
const TOP_SYMBOLS: usize = 10;

/// Pure aggregation over record collections.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportAggregator;

impl ReportAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Overall success rate of `records`. Empty input yields a zero rate.
    pub fn summarize<T>(records: &[T], success: impl Fn(&T) -> bool) -> GroupStats {
        let mut stats = GroupStats::default();
        for record in records {
            stats.record(success(record));
        }
        stats
    }

    /// Success rate per group key.
    pub fn group_by<T>(
        records: &[T],
        key: impl Fn(&T) -> String,
        success: impl Fn(&T) -> bool,
    ) -> GroupTable {
        let mut table = GroupTable::new();
        for record in records {
            table.entry(key(record)).or_default().record(success(record));
        }
        table
    }

    pub fn backtest_report(&self, run: &BacktestRun) -> BacktestReport {
        let records = &run.records;
        let touched = |r: &BacktestRecord| r.touched_range;

        BacktestReport {
            overall: Self::summarize(records, touched),
            by_confidence: Self::group_by(
                records,
                |r| format!("{:.1}", r.confidence_score.value()),
                touched,
            ),
            by_tier: Self::group_by(records, |r| r.confidence_score.tier().to_string(), touched),
            by_offset: Self::group_by(records, |r| r.test_offset.to_string(), touched),
            by_symbol: Self::group_by(records, |r| r.symbol.clone(), touched),
            skipped_iterations: run.skipped.len() as u32,
        }
    }

    pub fn evaluation_report(&self, records: &[EvaluationRecord]) -> EvaluationReport {
        let decisive: Vec<EvaluationRecord> = records
            .iter()
            .filter(|r| r.result.is_decisive())
            .cloned()
            .collect();
        let hit = |r: &EvaluationRecord| r.result == EvaluationResult::Hit;

        EvaluationReport {
            summary: EvaluationSummary::from_records(records),
            overall: Self::summarize(&decisive, hit),
            by_tier: Self::group_by(&decisive, |r| r.confidence_score.tier().to_string(), hit),
            by_symbol: Self::group_by(&decisive, |r| r.symbol.clone(), hit),
        }
    }

    /// Plain-text rendering of a backtest report.
    pub fn render_backtest(report: &BacktestReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== WALK-FORWARD BACKTEST REPORT ===");
        let _ = writeln!(out);

        if report.overall.count == 0 {
            let _ = writeln!(out, "No results to report.");
        } else {
            let _ = writeln!(out, "Overall Performance:");
            let _ = writeln!(out, "- Total Predictions: {}", report.overall.count);
            let _ = writeln!(out, "- Touched Range: {}", report.overall.successes);
            let _ = writeln!(out, "- Success Rate: {:.2}%", report.overall.rate * 100.0);

            write_table(
                &mut out,
                "Performance by Confidence Score",
                "score",
                report.by_confidence.iter(),
            );
            write_table(&mut out, "Performance by Confidence Tier", "tier", report.by_tier.iter());
            write_table(&mut out, "Performance by Test Day", "offset", report.by_offset.iter());

            let mut symbols: Vec<_> = report.by_symbol.iter().collect();
            symbols.sort_by(|a, b| {
                b.1.rate
                    .partial_cmp(&a.1.rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(b.0))
            });
            write_table(
                &mut out,
                "Top Performing Symbols",
                "symbol",
                symbols.into_iter().take(TOP_SYMBOLS),
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Skipped iterations: {}", report.skipped_iterations);
        out
    }

    /// Plain-text rendering of an evaluation report.
    pub fn render_evaluation(report: &EvaluationReport) -> String {
        let s = &report.summary;
        let mut out = String::new();
        let _ = writeln!(out, "=== END-OF-DAY EVALUATION ===");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Forecasts: {}", s.total);
        let _ = writeln!(
            out,
            "- HIT: {}  MISS: {}  NO_DATA: {}  ERROR: {}",
            s.hits, s.misses, s.no_data, s.errors
        );
        let _ = writeln!(out, "- Success Rate: {:.2}%", s.success_rate_pct);

        if !report.by_tier.is_empty() {
            write_table(&mut out, "Performance by Confidence Tier", "tier", report.by_tier.iter());
            write_table(&mut out, "Performance by Symbol", "symbol", report.by_symbol.iter());
        }
        out
    }
}

fn write_table<'a>(
    out: &mut String,
    title: &str,
    key_header: &str,
    rows: impl Iterator<Item = (&'a String, &'a GroupStats)>,
) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}:", title);
    let _ = writeln!(out, "{:<16} {:>7} {:>9} {:>7}", key_header, "count", "successes", "rate");
    for (key, stats) in rows {
        let _ = writeln!(
            out,
            "{:<16} {:>7} {:>9} {:>7.3}",
            key, stats.count, stats.successes, stats.rate
        );
    }
}
