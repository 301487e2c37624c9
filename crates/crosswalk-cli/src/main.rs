use clap::Parser;

mod cli;
pub mod exit_codes;

use cli::args::Cli;
use cli::commands::dispatch;
use crosswalk_core::ConvertError;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level()),
    )
    .init();

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

/// Exit code of the innermost conversion error; anything else is a plain failure.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ConvertError>())
        .map_or(exit_codes::FAILURE, ConvertError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use crosswalk_core::render::TemplateError;
    use crosswalk_core::DecodeError;

    #[test]
    fn test_exit_code_through_context() {
        let err: anyhow::Result<()> = Err(ConvertError::from(DecodeError::Schema("x".into())))
            .context("failed to convert input.json");
        let err = err.unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn test_each_conversion_error_keeps_its_code() {
        let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let cases = [
            (ConvertError::Read { path: "in.json".into(), source: io() }, 2),
            (ConvertError::Write { path: "out.md".into(), source: io() }, 4),
            (
                ConvertError::Template(TemplateError::Execute {
                    name: "report.md".into(),
                    message: "boom".into(),
                }),
                5,
            ),
            (ConvertError::Serialize("bad".into()), exit_codes::FAILURE),
        ];
        for (err, code) in cases {
            let err = anyhow::Error::new(err).context("outer");
            assert_eq!(exit_code_for(&err), code, "{err:#}");
        }
    }

    #[test]
    fn test_foreign_error_is_failure() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), exit_codes::FAILURE);
    }
}
