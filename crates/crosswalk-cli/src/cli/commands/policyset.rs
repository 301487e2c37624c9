//! CLI command: crosswalk policyset (alias: gemara-to-ampel)
//!
//! Usage:
//!   crosswalk policyset policy.yaml [policy.ampel.json]
//!
//! The generated tenets carry placeholder CEL code that must be completed
//! before the PolicySet is used with `ampel verify`.

use anyhow::{Context, Result};
use crosswalk_core::io::{read_document, Output};
use crosswalk_core::policyset::{self, default_output_path, PolicySetOptions};
use crosswalk_core::render::to_json_pretty;
use crosswalk_core::ConvertError;

use crate::cli::args::PolicySetArgs;
use crate::exit_codes;

pub fn run(args: PolicySetArgs) -> Result<i32> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let doc = read_document(&args.input)
        .with_context(|| format!("failed to load policy {}", args.input.display()))?;
    let set = policyset::convert(&doc, &PolicySetOptions::now())
        .map_err(ConvertError::from)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    Output::File(output_path.clone()).write_all(&to_json_pretty(&set)?)?;

    eprintln!("Ampel PolicySet saved to {}", output_path.display());
    eprintln!("  PolicySet ID: {}", set.id);
    eprintln!("  Policies:     {}", set.policies.len());
    Ok(exit_codes::SUCCESS)
}
