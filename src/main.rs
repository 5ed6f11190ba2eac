mod commands;

use crate::commands::Plog;
use clap::Parser;
use std::process::ExitCode;
use yansi::Paint;

fn main() -> ExitCode {
    yansi::whenever(yansi::Condition::STDERR_IS_TTY);
    let plog = Plog::parse();

    if let Err(err) = plog.run() {
        eprintln!("{}", format!("Error: {}", err).red());
        eprintln!();
        eprintln!("{}", "Caused by:".red());
        eprintln!("{}", format!("  {}", err.root_cause()).red());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
