use meridian_application::error::AppError;
use std::path::PathBuf;

pub(super) fn run_report(input: PathBuf) -> Result<(), AppError> {
    let deps = crate::infra::build_reporting_deps();
    let generated = meridian_application::reporting::generate_report(
        input.as_path(),
        deps.reader.as_ref(),
        deps.writer.as_ref(),
    )?;
    println!(
        "meridian cli: report regenerated (run_id={}, trades={}, bars={})",
        generated.run_id,
        generated.result.trades.len(),
        generated.result.daily_returns.len()
    );
    super::common::print_result_line(&generated.result.strategy_name, &generated.result);
    println!("report: {}", generated.input_dir.join("report.md").display());
    Ok(())
}
