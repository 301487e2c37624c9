use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "crosswalk",
    version,
    about = "Convert compliance records between OSCAL, Ampel and Gemara formats"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a posture report from OSCAL assessment results
    Posture(PostureArgs),
    /// Convert an Ampel policy result into a Gemara Layer 4 evaluation
    #[command(alias = "ampel-to-gemara")]
    Evaluation(EvaluationArgs),
    /// Export a Gemara Layer 2 catalog as Ampel policy stubs, one file per control
    #[command(alias = "ampel-export")]
    PolicyExport(PolicyExportArgs),
    /// Convert a Gemara Layer 3 policy into an Ampel PolicySet template
    #[command(alias = "gemara-to-ampel")]
    Policyset(PolicySetArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct PostureArgs {
    /// OSCAL assessment results (JSON or YAML)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file; `.md` renders the template, `.json` dumps the report data (default: Markdown to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// OSCAL component definition mapping components and controls to rules
    #[arg(long)]
    pub component_definition: Option<PathBuf>,

    /// OSCAL catalog supplying the report title
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Markdown template overriding the bundled one
    #[arg(long, env = "CROSSWALK_TEMPLATE")]
    pub template: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationFormat {
    Yaml,
    Json,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluationArgs {
    /// Ampel result or result set (JSON or YAML, optionally an in-toto statement)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: yaml, or json for a `.json` output path)
    #[arg(short, long, value_enum)]
    pub format: Option<EvaluationFormat>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PolicyExportArgs {
    /// Gemara Layer 2 control catalog
    pub catalog: PathBuf,

    /// Output directory for policy files
    #[arg(short, long, env = "CROSSWALK_POLICY_DIR", default_value = "./ampel-policies")]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PolicySetArgs {
    /// Gemara Layer 3 policy (YAML or JSON)
    pub input: PathBuf,

    /// Output PolicySet JSON (default: `<input stem>.ampel.json` next to the input)
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases_parse() {
        let cli = Cli::try_parse_from(["crosswalk", "ampel-to-gemara", "-i", "r.json"]).unwrap();
        assert!(matches!(cli.cmd, Command::Evaluation(_)));
        let cli = Cli::try_parse_from(["crosswalk", "ampel-export", "cat.yaml"]).unwrap();
        assert!(matches!(cli.cmd, Command::PolicyExport(_)));
        let cli = Cli::try_parse_from(["crosswalk", "gemara-to-ampel", "p.yaml"]).unwrap();
        assert!(matches!(cli.cmd, Command::Policyset(_)));
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["crosswalk", "-vv", "policyset", "p.yaml"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::try_parse_from(["crosswalk", "policyset", "p.yaml"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }
}
