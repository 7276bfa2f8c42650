use meridian_application::config::load_config_with_source;
use meridian_application::error::AppError;
use meridian_domain::services::engine::backtest::RunHooks;
use meridian_domain::services::engine::progress::ProgressChannel;
use std::path::PathBuf;

pub(super) fn run_backtest(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), AppError> {
    let (config, config_toml) = load_config_with_source(&config_path)?;
    super::common::print_config_summary("backtest", &config)?;

    let overall_start = std::time::Instant::now();
    let crate::infra::EngineDeps {
        market_data,
        artifacts,
    } = crate::infra::build_engine_deps(&config);

    let (progress, receiver) = ProgressChannel::bounded(64);
    let outcome = std::thread::scope(|scope| {
        scope.spawn(move || {
            let mut logged_decile = 0;
            for fraction in receiver {
                let decile = (fraction * 10.0) as usize;
                if decile > logged_decile {
                    logged_decile = decile;
                    tracing::debug!(progress = fraction, "backtest progress");
                }
            }
        });

        let mut on_progress = move |fraction: f64| progress.publish(fraction);
        let outcome = meridian_application::backtesting::run_backtest_with_hooks(
            &config,
            &config_toml,
            out,
            market_data.as_ref(),
            artifacts.as_ref(),
            RunHooks {
                on_progress: Some(&mut on_progress),
                should_cancel: None,
            },
        );
        // Closing the sender ends the listener before the scope joins it.
        drop(on_progress);
        outcome
    })?;

    super::common::print_result_line(&outcome.result.strategy_name, &outcome.result);
    println!(
        "bars: kept={} dropped_duplicates={} dropped_invalid_close={} out_of_range={} gaps={}",
        outcome.data_quality.kept_bars,
        outcome.data_quality.duplicates,
        outcome.data_quality.invalid_close,
        outcome.data_quality.out_of_range,
        outcome.data_quality.gaps
    );
    println!("run output: {}", outcome.run_dir.display());
    println!(
        "meridian cli: backtest total_ms={}",
        overall_start.elapsed().as_millis()
    );
    Ok(())
}
