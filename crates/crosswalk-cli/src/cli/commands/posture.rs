//! CLI command: crosswalk posture
//!
//! Render OSCAL assessment results as a posture report.
//!
//! Usage:
//!   crosswalk posture -i assessment-results.json [-o report.md|report.json]
//!                     [--component-definition cd.json] [--catalog catalog.json]
//!                     [--template custom.md]

use anyhow::{Context, Result};
use crosswalk_core::io::{read_document, read_optional, Output};
use crosswalk_core::posture::PostureMapper;
use crosswalk_core::render::to_json_pretty;
use crosswalk_core::{ConvertError, OutputFormat, RenderConfig, Renderer, TemplateSource};

use crate::cli::args::PostureArgs;
use crate::exit_codes;

pub fn run(args: PostureArgs) -> Result<i32> {
    let assessment_results = read_document(&args.input)
        .with_context(|| format!("failed to load assessment results {}", args.input.display()))?;
    let component_definition = read_optional(args.component_definition.as_deref())
        .context("failed to load component definition")?;
    let catalog = read_optional(args.catalog.as_deref()).context("failed to load catalog")?;

    let mapper = PostureMapper::new(
        &assessment_results,
        component_definition.as_ref(),
        catalog.as_ref(),
    )
    .map_err(ConvertError::from)
    .with_context(|| format!("failed to map {}", args.input.display()))?;
    let report = mapper.to_template_value();

    // Read and decode failures are fatal whatever the output extension.
    let format = match &args.output {
        None => OutputFormat::Markdown,
        Some(path) => match OutputFormat::from_extension(path) {
            Some(format @ (OutputFormat::Json | OutputFormat::Markdown)) => format,
            _ => {
                tracing::warn!(
                    output = %path.display(),
                    "unsupported report extension (expected .md or .json); nothing written"
                );
                return Ok(exit_codes::SUCCESS);
            }
        },
    };

    let bytes = match format {
        OutputFormat::Json => to_json_pretty(&report)?,
        _ => {
            let config = RenderConfig {
                template: TemplateSource::from_override(args.template.clone()),
            };
            Renderer::new(&config)
                .context("failed to load report template")?
                .render(&report)
                .context("failed to render posture report")?
        }
    };

    let output = Output::from_path(args.output.clone());
    output.write_all(&bytes)?;
    if let Output::File(path) = &output {
        eprintln!("Posture report written to {}", path.display());
    }
    Ok(exit_codes::SUCCESS)
}
