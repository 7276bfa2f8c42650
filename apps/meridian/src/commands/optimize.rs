use meridian_application::config::load_config_with_source;
use meridian_application::error::AppError;
use std::path::PathBuf;

pub(super) fn run_optimize(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), AppError> {
    let (config, config_toml) = load_config_with_source(&config_path)?;
    super::common::print_config_summary("optimize", &config)?;

    let overall_start = std::time::Instant::now();
    let crate::infra::EngineDeps {
        market_data,
        artifacts,
    } = crate::infra::build_engine_deps(&config);

    let output = meridian_application::experiments::optimize::optimize_from_config(
        &config,
        &config_toml,
        out,
        market_data.as_ref(),
        artifacts.as_ref(),
    )?;

    let result = &output.result;
    println!(
        "grid: {} combinations, {} evaluated, {} failed",
        result.grid_size,
        result.entries.len(),
        result.failed()
    );
    if let Some((params, best)) = &result.best {
        super::common::print_result_line("best", best);
        println!("best params: {}", serde_json::to_string(params)?);
    }
    println!("optimize output: {}", output.optimize_dir.display());
    println!(
        "meridian cli: optimize total_ms={}",
        overall_start.elapsed().as_millis()
    );
    Ok(())
}
