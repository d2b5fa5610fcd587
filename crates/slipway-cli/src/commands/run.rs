use super::{describe_plan, format_action, json_pretty, ok_line, EXIT_SUCCESS};
use slipway_core::{CoreError, Deployment, ProcessRunner, RunType};
use slipway_remote::HttpClientFactory;
use std::path::Path;

pub fn run(
    root: &Path,
    run_type: &str,
    tool: &str,
    keep_config: bool,
    json: bool,
) -> Result<u8, String> {
    let run_type: RunType = run_type
        .parse()
        .map_err(|e: CoreError| e.to_string())?;
    let runner = ProcessRunner::new(tool);
    let factory = HttpClientFactory;

    let report = Deployment::new(root, &runner, &factory)
        .keep_artifact(keep_config)
        .execute(&run_type)
        .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "{}",
        ok_line(&format!(
            "{} finished for {} ({})",
            report.run_type,
            report.environment,
            describe_plan(report.artifact)
        ))
    );
    if report.artifact_kept {
        println!("config kept at {}", report.artifact_path.display());
    }
    if run_type.is_deploy() {
        if report.event_sources.is_empty() {
            println!("no event sources declared");
        } else {
            println!("event sources:");
            for action in &report.event_sources {
                println!("{}", format_action(action));
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
