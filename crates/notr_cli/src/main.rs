//! CLI entry point for inspecting stored note bodies.
//!
//! # Responsibility
//! - Verify `notr_core` linkage with a deterministic ping.
//! - Render or convert a `{schema, doc}` JSON file without a host UI.
//!
//! # Invariants
//! - Usage errors exit with status 2 before any file is read.

use std::fmt::{Display, Formatter};
use std::process::ExitCode;

const USAGE: &str = "usage: notr_cli [render|toggle] <doc.json>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Toggle,
}

impl Command {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "render" => Some(Self::Render),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CliError {
    Usage(String),
    Failed(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Failed(_) => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => f.write_str(message),
            Self::Failed(message) => write!(f, "error: {message}"),
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match execute(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn execute(args: &[String]) -> Result<String, CliError> {
    match args {
        [] => Ok(format!(
            "notr_core ping={}\nnotr_core version={}",
            notr_core::ping(),
            notr_core::core_version()
        )),
        [command, path] => {
            let command = Command::parse(command).ok_or_else(|| {
                CliError::Usage(format!("unknown command `{command}`; {USAGE}"))
            })?;
            run(command, path).map_err(CliError::Failed)
        }
        _ => Err(CliError::Usage(USAGE.to_string())),
    }
}

fn run(command: Command, path: &str) -> Result<String, String> {
    let input =
        std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let doc = notr_core::from_json_str(&input).map_err(|err| err.to_string())?;
    match command {
        Command::Render => Ok(notr_core::render_static(&doc)),
        Command::Toggle => notr_core::to_json_string(&notr_core::toggle_schema(&doc))
            .map_err(|err| err.to_string()),
    }
}
