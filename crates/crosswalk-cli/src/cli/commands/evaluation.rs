//! CLI command: crosswalk evaluation (alias: ampel-to-gemara)
//!
//! Convert an Ampel policy evaluation result into a Gemara Layer 4 evaluation.
//!
//! Usage:
//!   crosswalk evaluation -i result.json [-o evaluation.yaml] [--format yaml|json]

use anyhow::{Context, Result};
use crosswalk_core::evaluation;
use crosswalk_core::io::{read_document, Output};
use crosswalk_core::render::{to_json_pretty, to_yaml};
use crosswalk_core::{ConvertError, OutputFormat};

use crate::cli::args::{EvaluationArgs, EvaluationFormat};
use crate::exit_codes;

pub fn run(args: EvaluationArgs) -> Result<i32> {
    let doc = read_document(&args.input)
        .with_context(|| format!("failed to load policy result {}", args.input.display()))?;
    let gemara = evaluation::convert(&doc)
        .map_err(ConvertError::from)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    let bytes = match output_format(&args) {
        EvaluationFormat::Json => to_json_pretty(&gemara)?,
        EvaluationFormat::Yaml => to_yaml(&gemara)?,
    };

    let output = Output::from_path(args.output.clone());
    output.write_all(&bytes)?;
    if let Output::File(path) = &output {
        eprintln!(
            "Gemara evaluation ({} result(s)) written to {}",
            gemara.evaluations.len(),
            path.display()
        );
    }
    Ok(exit_codes::SUCCESS)
}

/// An explicit `--format` wins; otherwise a `.json` output path selects JSON.
fn output_format(args: &EvaluationArgs) -> EvaluationFormat {
    if let Some(format) = args.format {
        return format;
    }
    match args.output.as_deref().and_then(OutputFormat::from_extension) {
        Some(OutputFormat::Json) => EvaluationFormat::Json,
        _ => EvaluationFormat::Yaml,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(output: Option<&str>, format: Option<EvaluationFormat>) -> EvaluationArgs {
        EvaluationArgs {
            input: PathBuf::from("result.json"),
            output: output.map(PathBuf::from),
            format,
        }
    }

    #[test]
    fn test_output_format_selection() {
        assert_eq!(output_format(&args(None, None)), EvaluationFormat::Yaml);
        assert_eq!(output_format(&args(Some("out.json"), None)), EvaluationFormat::Json);
        assert_eq!(output_format(&args(Some("out.yaml"), None)), EvaluationFormat::Yaml);
        assert_eq!(
            output_format(&args(Some("out.json"), Some(EvaluationFormat::Yaml))),
            EvaluationFormat::Yaml
        );
    }
}
