use meridian_application::config::load_config_with_source;
use meridian_application::error::AppError;
use std::path::PathBuf;

pub(super) fn run_batch(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), AppError> {
    let (config, config_toml) = load_config_with_source(&config_path)?;
    super::common::print_config_summary("batch", &config)?;

    let overall_start = std::time::Instant::now();
    let crate::infra::EngineDeps {
        market_data,
        artifacts,
    } = crate::infra::build_engine_deps(&config);

    let output = meridian_application::experiments::batch::run_batch_from_config(
        &config,
        &config_toml,
        out,
        market_data.as_ref(),
        artifacts.as_ref(),
    )?;

    for outcome in &output.outcomes {
        match &outcome.result {
            Ok(result) => super::common::print_result_line(&outcome.label, result),
            Err(err) => println!("{}: failed ({}): {err}", outcome.label, outcome.strategy),
        }
    }
    println!(
        "batch output: {} ({} runs, {} failed)",
        output.batch_dir.display(),
        output.outcomes.len(),
        output.failed()
    );
    println!(
        "meridian cli: batch total_ms={}",
        overall_start.elapsed().as_millis()
    );
    Ok(())
}
