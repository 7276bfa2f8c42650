use meridian_application::config::load_config;
use meridian_application::error::AppError;
use std::path::PathBuf;

pub(super) fn run_validate(config_path: PathBuf) -> Result<(), AppError> {
    let config = load_config(&config_path)?;
    super::common::print_config_summary("validate", &config)?;

    let market_data = crate::infra::build_market_data_repo(&config);
    let report = meridian_application::validation::validate(&config, market_data.as_ref())?;

    let dq = &report.data_quality;
    println!(
        "ohlcv report: input={} kept={} duplicates={} out_of_order={} invalid_close={} out_of_range={} gaps={}",
        dq.input_bars,
        dq.kept_bars,
        dq.duplicates,
        dq.out_of_order,
        dq.invalid_close,
        dq.out_of_range,
        dq.gaps
    );
    println!("warm-up: {} bars", report.warm_up_bars);
    if report.batch_runs > 0 {
        println!("batch: {} runs", report.batch_runs);
    }
    if let Some(grid) = report.optimize_grid {
        println!("optimize: {grid} combinations before sampling");
    }
    println!("config ok");
    Ok(())
}
