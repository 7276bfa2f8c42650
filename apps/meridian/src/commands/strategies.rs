use meridian_application::error::AppError;
use meridian_domain::services::strategy::list_strategies;

pub(super) fn run_strategies(json: bool) -> Result<(), AppError> {
    let catalogue = list_strategies();
    if json {
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }

    for descriptor in &catalogue {
        println!(
            "{} [{}]: {}",
            descriptor.family.label(),
            descriptor.timeframe,
            descriptor.sub_strategies.join(", ")
        );
        for (key, value) in descriptor.default_parameters.iter() {
            println!("  {key} = {value}");
        }
    }
    Ok(())
}
