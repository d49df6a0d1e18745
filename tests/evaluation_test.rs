//! Forecast and end-of-day evaluation cycle tests

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rangecast::{
    AccuracyEvaluator, ConfidenceScore, EvaluationResult, EvaluationSummary, ForecastRecord,
    ForecastStore, Forecaster, InMemoryPriceSource, Interval, Metric, PriceBar, Recommendation,
    ReportAggregator,
};

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 3, 45, 0).unwrap()
}

fn evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()
}

/// Five-minute bars from `start` up to (not including) `end`.
fn load(source: &InMemoryPriceSource, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
    let mut bars = Vec::new();
    let mut timestamp = start;
    let mut i = 0;
    while timestamp < end {
        let close = 800.0 + (i as f64 / 40.0).sin() * 6.0 + i as f64 * 0.001;
        bars.push(PriceBar {
            timestamp,
            open: close - 0.1,
            high: close + 0.8,
            low: close - 0.8,
            close,
            volume: 3_000.0 + (i % 9) as f64 * 150.0,
        });
        timestamp += Duration::minutes(5);
        i += 1;
    }
    source.insert_bars(symbol, Interval::FiveMinute, bars).unwrap();
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_accuracy_outcomes() {
    let evaluator = AccuracyEvaluator::default();
    assert_eq!(
        evaluator.evaluate(&Metric::Value(100.0), &Metric::Value(101.5)),
        EvaluationResult::Hit
    );
    assert_eq!(
        evaluator.evaluate(&Metric::Value(100.0), &Metric::Value(103.0)),
        EvaluationResult::Miss
    );
    assert_eq!(
        evaluator.evaluate(&Metric::Value(100.0), &Metric::Missing),
        EvaluationResult::NoData
    );
    assert_eq!(
        evaluator.evaluate(&Metric::parse("n/a"), &Metric::Value(100.0)),
        EvaluationResult::Error
    );
}

#[test]
fn test_forecast_store_and_evaluate_cycle() {
    let source = InMemoryPriceSource::new();
    let history_start = morning() - Duration::days(20);
    load(&source, "HDFCBANK.NS", history_start, evening());
    load(&source, "ICICIBANK.NS", history_start, evening());
    // No bars on the evaluation day
    load(&source, "TITAN.NS", history_start, morning() - Duration::days(1));

    let run = Forecaster::new(30, 5).forecast(
        &symbols(&["HDFCBANK.NS", "ICICIBANK.NS", "TITAN.NS", "NOPE.NS"]),
        &source,
        morning(),
    );
    assert_eq!(run.forecasts.len(), 3);
    assert_eq!(run.skipped, symbols(&["NOPE.NS"]));
    let ranks: Vec<u32> = run.forecasts.iter().map(|f| f.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let dir = std::env::temp_dir().join(format!("rangecast-cycle-{}", std::process::id()));
    let date = morning().date_naive();
    ForecastStore::with_dir(&dir)
        .unwrap()
        .save_forecasts(date, run.forecasts.clone())
        .unwrap();

    // Evening cycle reads the morning's file
    let store = ForecastStore::with_dir(&dir).unwrap();
    let forecasts = store.forecasts(date).unwrap();
    assert_eq!(forecasts, run.forecasts);

    let evaluations =
        AccuracyEvaluator::default().evaluate_forecasts(&forecasts, &source, evening());
    assert_eq!(evaluations.len(), 3);

    for (evaluation, forecast) in evaluations.iter().zip(&forecasts) {
        assert_eq!(evaluation.recommendation, forecast.recommendation);
        assert_eq!(evaluation.reason, forecast.reason);
    }

    for evaluation in &evaluations {
        assert_eq!(evaluation.date, date);
        if evaluation.symbol == "TITAN.NS" {
            assert_eq!(evaluation.result, EvaluationResult::NoData);
            assert!(evaluation.actual_close.is_missing());
        } else {
            assert!(evaluation.result.is_decisive());
            let high = evaluation.actual_high.value().unwrap();
            let low = evaluation.actual_low.value().unwrap();
            let close = evaluation.actual_close.value().unwrap();
            assert!(low <= close && close <= high);
        }
    }

    store.save_evaluations(date, evaluations.clone()).unwrap();
    let summary = EvaluationSummary::from_records(&evaluations);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.no_data, 1);
    assert_eq!(summary.hits + summary.misses, 2);

    let report = ReportAggregator.evaluation_report(&evaluations);
    assert_eq!(report.overall.count, 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_evaluation_ignores_bars_after_as_of() {
    let source = InMemoryPriceSource::new();
    let day_start = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
    let bars: Vec<PriceBar> = (0..24 * 12)
        .map(|i| {
            let timestamp = day_start + Duration::minutes(5 * i);
            let close = if timestamp < evening() { 800.0 } else { 9_999.0 };
            PriceBar {
                timestamp,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect();
    source.insert_bars("LT.NS", Interval::FiveMinute, bars).unwrap();

    let forecast = ForecastRecord {
        rank: 1,
        symbol: "LT.NS".to_string(),
        date: day_start.date_naive(),
        confidence_score: ConfidenceScore::new(2.0),
        current_close: Metric::Value(800.0),
        predicted_min: Metric::Value(795.0),
        predicted_close: Metric::Value(805.0),
        predicted_max: Metric::Value(815.0),
        recommendation: Recommendation::Buy,
        reason: Recommendation::Buy.reason().to_string(),
    };

    let forecasts = vec![forecast];
    let evaluator = AccuracyEvaluator::default();

    let evaluations = evaluator.evaluate_forecasts(&forecasts, &source, evening());
    assert_eq!(evaluations[0].actual_close, Metric::Value(800.0));
    assert_eq!(evaluations[0].actual_high, Metric::Value(801.0));
    assert_eq!(evaluations[0].result, EvaluationResult::Hit);

    // Nothing of the day has happened yet at midnight
    let evaluations = evaluator.evaluate_forecasts(&forecasts, &source, day_start);
    assert_eq!(evaluations[0].result, EvaluationResult::NoData);
}

#[test]
fn test_forecast_record_sentinel_fields() {
    let record = ForecastRecord {
        rank: 1,
        symbol: "MARUTI.NS".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        confidence_score: ConfidenceScore::new(0.5),
        current_close: Metric::Value(12_000.0),
        predicted_min: Metric::Missing,
        predicted_close: Metric::Missing,
        predicted_max: Metric::Missing,
        recommendation: Recommendation::Hold,
        reason: Recommendation::Hold.reason().to_string(),
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["predicted_close"], "-");
    assert_eq!(json["current_close"], 12_000.0);
    assert_eq!(json["confidence_score"], 0.5);
    assert_eq!(json["recommendation"], "HOLD");

    let parsed: ForecastRecord = serde_json::from_str(
        r#"{"rank":2,"symbol":"ITC.NS","date":"2024-06-03","confidence_score":1.5,
            "current_close":"-","predicted_min":430.1,"predicted_close":"435.5",
            "predicted_max":"-"}"#,
    )
    .unwrap();
    assert!(parsed.current_close.is_missing());
    assert_eq!(parsed.predicted_min, Metric::Value(430.1));
    assert_eq!(parsed.predicted_close, Metric::Value(435.5));
    // Files written without a recommendation still load
    assert_eq!(parsed.recommendation, Recommendation::Hold);
    assert!(parsed.reason.is_empty());
}

#[test]
fn test_empty_summary_has_zero_rate() {
    let summary = EvaluationSummary::from_records(&[]);
    assert_eq!(summary.success_rate_pct, 0.0);
}
