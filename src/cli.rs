use std::env;
use thiserror::Error;

use crate::logger::Logger;
use crate::plugin::generator::{Phase, UnknownPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { plugin_name: String },
    Generate { plugin_name: String, phase: Phase },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing arguments")]
    MissingArguments,
    #[error("unknown command '{0}' (supported: start, generate)")]
    UnknownCommand(String),
    #[error("generate needs a phase")]
    MissingPhase,
    #[error(transparent)]
    UnknownPhase(#[from] UnknownPhase),
}

/// Parse `<command> <plugin_name> [phase]`; `args` excludes the program name.
pub fn parse_args(args: &[String]) -> Result<Command, UsageError> {
    let (command, plugin_name) = match args {
        [command, plugin_name, ..] => (command.as_str(), plugin_name.clone()),
        _ => return Err(UsageError::MissingArguments),
    };

    match command {
        "start" => Ok(Command::Start { plugin_name }),
        "generate" => {
            let phase: Phase = args.get(2).ok_or(UsageError::MissingPhase)?.parse()?;
            Ok(Command::Generate { plugin_name, phase })
        }
        other => Err(UsageError::UnknownCommand(other.to_string())),
    }
}

pub fn print_usage(logger: &Logger) {
    let phases = Phase::ALL.map(Phase::as_str).join(", ");
    logger.log("spacehook CLI");
    logger.log("Usage: spacehook {command}");
    logger.log("");
    logger.log("Commands:");
    logger.log("  start {plugin_name}");
    logger.log("    Start the plugin with the given name.");
    logger.log("    \"spacehook start my_custom_app\"");
    logger.log(" ");
    logger.log("  generate {plugin_name} {phase}");
    logger.log("    Generate OpenTofu code to create the plugin.");
    logger.log(format!("    Phases: {}", phases));
    logger.log("    \"spacehook generate my_custom_app after_apply\"");
}

/// Parse the process arguments, printing usage and exiting 1 on a usage error.
pub fn get_opts(logger: &Logger) -> Command {
    let args: Vec<String> = env::args().skip(1).collect();
    match parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            if err != UsageError::MissingArguments {
                logger.error(&err);
            }
            print_usage(logger);
            std::process::exit(1);
        }
    }
}
