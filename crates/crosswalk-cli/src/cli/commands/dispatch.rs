use super::super::args::*;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Posture(args) => super::posture::run(args),
        Command::Evaluation(args) => super::evaluation::run(args),
        Command::PolicyExport(args) => super::policy::run(args),
        Command::Policyset(args) => super::policyset::run(args),
    }
}
