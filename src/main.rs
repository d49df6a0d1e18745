use anyhow::bail;
use rangecast::{
    AccuracyEvaluator, AliasedSource, AppError, Config, ForecastStore, Forecaster,
    InMemoryPriceSource, PriceSource, ReportAggregator, WalkForwardBacktester,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: rangecast [backtest|forecast|evaluate]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rangecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let command = std::env::args().nth(1).unwrap_or_else(|| "backtest".to_string());

    info!(
        "Running {} for {} symbols as of {}",
        command,
        config.symbols.len(),
        config.as_of
    );

    match command.as_str() {
        "backtest" => backtest(&config).await?,
        "forecast" => forecast(&config)?,
        "evaluate" => evaluate(&config)?,
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }

    Ok(())
}

fn price_source(config: &Config) -> rangecast::Result<Arc<dyn PriceSource>> {
    let Some(dir) = &config.data_dir else {
        return Err(AppError::Config("DATA_DIR is not set".to_string()));
    };

    let history = InMemoryPriceSource::load_dir(dir)?;
    if history.is_empty() {
        warn!("No price history found in {}", dir.display());
    }

    Ok(Arc::new(AliasedSource::new(history, config.aliases.clone())))
}

fn forecast_store(config: &Config) -> rangecast::Result<ForecastStore> {
    match &config.forecast_dir {
        Some(dir) => Ok(ForecastStore::with_dir(dir)?),
        None => {
            warn!("FORECAST_DIR is not set, forecasts will not be persisted");
            Ok(ForecastStore::new())
        }
    }
}

async fn backtest(config: &Config) -> rangecast::Result<()> {
    let source = price_source(config)?;
    let backtester = Arc::new(WalkForwardBacktester::new());

    let run = backtester
        .run_parallel(&config.backtest_config(), source)
        .await?;

    let report = ReportAggregator.backtest_report(&run);
    println!("{}", ReportAggregator::render_backtest(&report));
    Ok(())
}

fn forecast(config: &Config) -> rangecast::Result<()> {
    let source = price_source(config)?;
    let store = forecast_store(config)?;

    let run = Forecaster::new(config.lookback_days, config.top_n)
        .with_interval(config.interval)
        .forecast(&config.symbols, source.as_ref(), config.as_of);

    println!("{}", serde_json::to_string_pretty(&run.forecasts)?);
    store.save_forecasts(config.as_of.date_naive(), run.forecasts)?;
    Ok(())
}

fn evaluate(config: &Config) -> rangecast::Result<()> {
    let source = price_source(config)?;
    let store = forecast_store(config)?;
    let date = config.as_of.date_naive();

    let forecasts = store.forecasts(date)?;
    let evaluations = AccuracyEvaluator::new(config.hit_tolerance_pct).evaluate_forecasts(
        &forecasts,
        source.as_ref(),
        config.as_of,
    );

    let report = ReportAggregator.evaluation_report(&evaluations);
    println!("{}", ReportAggregator::render_evaluation(&report));
    store.save_evaluations(date, evaluations)?;
    Ok(())
}
