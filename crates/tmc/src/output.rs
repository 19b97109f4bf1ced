//! Output formatting for trees and objects: JSON, compact JSON, YAML.

use std::io::{self, Write};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render any serde-serializable value in the chosen format.
pub fn render<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data)
            .map(|s| s.trim_end().to_owned())
            .map_err(|e| e.to_string()),
    };
    rendered.map_err(CliError::Output)
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_each_format() {
        let data = json!({"name": "g1", "meta": [{"labels": {"env": "dev"}}]});

        let compact = render(OutputFormat::JsonCompact, &data).unwrap();
        assert_eq!(compact, r#"{"name":"g1","meta":[{"labels":{"env":"dev"}}]}"#);

        let yaml = render(OutputFormat::Yaml, &data).unwrap();
        assert!(yaml.starts_with("name: g1"));
        assert!(!yaml.ends_with('\n'));
    }
}
