use crate::layer::{EnvironmentVariables, RawConfigText};
use serde::Serialize;
use thiserror::Error;

/// Line opening the generated `environment_variables` region.
pub const START_SENTINEL: &str = "# === START_ENV_VARIABLES ===";
/// Line closing the generated `environment_variables` region.
pub const END_SENTINEL: &str = "# === END_ENV_VARIABLES ===";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpliceError {
    #[error("start marker on line {start_line} has no matching end marker")]
    Unterminated { start_line: usize },
    #[error("a second managed region starts on line {line}, only one is allowed")]
    Duplicate { line: usize },
}

#[derive(Serialize)]
struct ManagedRegion<'a> {
    environment_variables: &'a EnvironmentVariables,
}

/// Serialize the composed variables as the body of the managed region, in
/// block style. An empty set renders as `environment_variables: {}` so the
/// artifact still holds a mapping.
pub fn render_region(vars: &EnvironmentVariables) -> Result<String, serde_yaml_bw::Error> {
    let text = serde_yaml_bw::to_string(&ManagedRegion {
        environment_variables: vars,
    })?;
    // A document marker here would split the artifact into two documents.
    Ok(match text.strip_prefix("---\n") {
        Some(body) => body.to_owned(),
        None => text,
    })
}

/// Replace the body of the managed region in `raw` with `region`.
///
/// Both sentinel lines are kept, so splicing the result again with the same
/// content is a no-op. Every line outside the region is emitted unchanged and
/// in order. A file without a start sentinel is returned as-is.
pub fn splice(raw: &RawConfigText, region: &str) -> Result<String, SpliceError> {
    let mut out = String::new();
    let mut pass_through = true;
    let mut seen_start = false;
    let mut open_at: Option<usize> = None;

    for (idx, line) in raw.lines().iter().enumerate() {
        let marker = line.trim();

        if marker == END_SENTINEL {
            pass_through = true;
            open_at = None;
        }

        if pass_through {
            out.push_str(line);
        }

        if marker == START_SENTINEL {
            if seen_start {
                return Err(SpliceError::Duplicate { line: idx + 1 });
            }
            seen_start = true;
            pass_through = false;
            open_at = Some(idx + 1);

            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(region);
            if !region.is_empty() && !region.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    if let Some(start_line) = open_at {
        return Err(SpliceError::Unterminated { start_line });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGION: &str = "environment_variables:\n  host: Rozelle\n  region: Snowdream\n";

    fn raw(text: &str) -> RawConfigText {
        RawConfigText::new(text)
    }

    #[test]
    fn no_start_sentinel_is_identity() {
        let input = "region: us-east-1\n# just a comment\nfunction_name: f\n";
        assert_eq!(splice(&raw(input), REGION).unwrap(), input);
    }

    #[test]
    fn replaces_only_the_region_body() {
        let input = "\
region: us-east-1
  # === START_ENV_VARIABLES ===
environment_variables:
  region: Mesa Blanca
# === END_ENV_VARIABLES ===
handler: service.handler
";
        let out = splice(&raw(input), REGION).unwrap();
        assert_eq!(
            out,
            format!(
                "region: us-east-1\n  # === START_ENV_VARIABLES ===\n{REGION}# === END_ENV_VARIABLES ===\nhandler: service.handler\n"
            )
        );
    }

    #[test]
    fn splicing_twice_is_idempotent() {
        let input = "a: 1\n# === START_ENV_VARIABLES ===\nold: body\n# === END_ENV_VARIABLES ===\nb: 2\n";
        let once = splice(&raw(input), REGION).unwrap();
        let twice = splice(&raw(&once), REGION).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_region_body_receives_content() {
        let input = "# === START_ENV_VARIABLES ===\n# === END_ENV_VARIABLES ===\n";
        let out = splice(&raw(input), REGION).unwrap();
        assert_eq!(
            out,
            format!("# === START_ENV_VARIABLES ===\n{REGION}# === END_ENV_VARIABLES ===\n")
        );
    }

    #[test]
    fn missing_end_sentinel_is_rejected() {
        let input = "a: 1\n# === START_ENV_VARIABLES ===\nold: body\ntail: lost\n";
        assert_eq!(
            splice(&raw(input), REGION),
            Err(SpliceError::Unterminated { start_line: 2 })
        );
    }

    #[test]
    fn second_region_is_rejected() {
        let input = "\
# === START_ENV_VARIABLES ===
# === END_ENV_VARIABLES ===
# === START_ENV_VARIABLES ===
# === END_ENV_VARIABLES ===
";
        assert_eq!(
            splice(&raw(input), REGION),
            Err(SpliceError::Duplicate { line: 3 })
        );
    }

    #[test]
    fn stray_end_sentinel_passes_through() {
        let input = "a: 1\n# === END_ENV_VARIABLES ===\nb: 2\n";
        assert_eq!(splice(&raw(input), REGION).unwrap(), input);
    }

    #[test]
    fn start_sentinel_on_last_line_without_newline() {
        let input = "a: 1\n# === START_ENV_VARIABLES ===";
        assert!(matches!(
            splice(&raw(input), REGION),
            Err(SpliceError::Unterminated { start_line: 2 })
        ));
    }

    #[test]
    fn rendered_region_is_block_style() {
        let mut vars = EnvironmentVariables::new();
        vars.insert("region".to_owned(), serde_yaml_bw::from_str("Snowdream").unwrap());
        vars.insert("host".to_owned(), serde_yaml_bw::from_str("Rozelle").unwrap());
        let rendered = render_region(&vars).unwrap();
        assert!(rendered.starts_with("environment_variables:\n"));
        assert!(!rendered.contains('{'));
        let host = rendered.find("host: Rozelle").unwrap();
        let region = rendered.find("region: Snowdream").unwrap();
        assert!(host < region, "keys are rendered in sorted order");
    }

    #[test]
    fn empty_variables_render_as_empty_mapping() {
        let rendered = render_region(&EnvironmentVariables::new()).unwrap();
        assert_eq!(rendered, "environment_variables: {}\n");
        let reparsed = crate::layer::parse_layer_str(&rendered).unwrap();
        assert_eq!(
            reparsed.environment_variables,
            Some(EnvironmentVariables::new())
        );
    }
}
