//! Line commands understood by the interactive host.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Free text forwarded to the reasoning service.
    Instruction(String),
    Undo(String),
    Swap(String),
    View(String),
    Pick { x: f32, z: f32 },
    Describe,
    State,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("`:{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`:pick` takes two numbers, got {0:?}")]
    BadPoint(String),
    #[error("unknown command `:{0}` (try :help)")]
    Unknown(String),
}

pub const HELP: &str = "\
commands:
  <text>           send an instruction to the reasoning service
  :undo <id>       restore an item's previous pose
  :swap <id>       switch an item to its next variant
  :view <name>     move the camera (corner, birdseye, entrance, window, side)
  :pick <x> <z>    name the item at a floor point
  :describe        print the last room description
  :state           print the room state as JSON
  :quit            exit";

impl HostCommand {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<HostCommand>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Some(HostCommand::Instruction(line.to_string())));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        let required = |command: &'static str| {
            if argument.is_empty() {
                Err(CommandError::MissingArgument(command))
            } else {
                Ok(argument.to_string())
            }
        };

        let command = match name {
            "undo" | "u" => HostCommand::Undo(required("undo")?),
            "swap" | "s" => HostCommand::Swap(required("swap")?),
            "view" | "v" => HostCommand::View(required("view")?),
            "pick" => {
                let mut numbers = argument.split_whitespace().map(str::parse::<f32>);
                match (numbers.next(), numbers.next(), numbers.next()) {
                    (Some(Ok(x)), Some(Ok(z)), None) => HostCommand::Pick { x, z },
                    _ => return Err(CommandError::BadPoint(argument.to_string())),
                }
            }
            "describe" | "d" => HostCommand::Describe,
            "state" => HostCommand::State,
            "help" | "h" | "?" => HostCommand::Help,
            "quit" | "q" | "exit" => HostCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_instruction() {
        assert_eq!(
            HostCommand::parse("  put the bed by the window "),
            Ok(Some(HostCommand::Instruction("put the bed by the window".to_string())))
        );
        assert_eq!(HostCommand::parse("   "), Ok(None));
    }

    #[test]
    fn colon_commands_take_their_arguments() {
        assert_eq!(
            HostCommand::parse(":undo sofa"),
            Ok(Some(HostCommand::Undo("sofa".to_string())))
        );
        assert_eq!(
            HostCommand::parse(":view  birdseye"),
            Ok(Some(HostCommand::View("birdseye".to_string())))
        );
        assert_eq!(
            HostCommand::parse(":pick 1.5 2"),
            Ok(Some(HostCommand::Pick { x: 1.5, z: 2.0 }))
        );
        assert_eq!(HostCommand::parse(":q"), Ok(Some(HostCommand::Quit)));
    }

    #[test]
    fn malformed_commands_are_reported() {
        assert_eq!(
            HostCommand::parse(":swap"),
            Err(CommandError::MissingArgument("swap"))
        );
        assert!(matches!(
            HostCommand::parse(":pick 1"),
            Err(CommandError::BadPoint(_))
        ));
        assert_eq!(
            HostCommand::parse(":dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }
}
