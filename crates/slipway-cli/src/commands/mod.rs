pub mod run;

use slipway_config::ArtifactPlan;
use slipway_core::ReconcileAction;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_REMOTE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn ok_line(msg: &str) -> String {
    use console::Style;
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn describe_plan(plan: ArtifactPlan) -> &'static str {
    match plan {
        ArtifactPlan::CopyVerbatim => "base config copied",
        ArtifactPlan::Splice => "environment variables spliced",
    }
}

/// One summary line per reconciled trigger, verb colored by outcome.
pub fn format_action(action: &ReconcileAction) -> String {
    use console::Style;
    let (verb, style, arn, uuid) = match action {
        ReconcileAction::Created {
            event_source_arn,
            uuid,
        } => ("created", Style::new().green(), event_source_arn, uuid),
        ReconcileAction::Updated {
            event_source_arn,
            uuid,
        } => ("updated", Style::new().cyan(), event_source_arn, uuid),
    };
    format!("  {:<8} {arn} ({uuid})", style.apply_to(verb))
}
