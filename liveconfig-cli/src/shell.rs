//! Line-oriented control shell.
//!
//! ```text
//! classes                          list classes and instance counts
//! instances <class>                list instances of a class
//! show [<instance>]                attributes of one or every instance
//! get <instance> <attr>            one attribute
//! set <instance> <attr> <value…>   coerced update (value = rest of line)
//! save                             write a snapshot through the file handler
//! help | quit | exit
//! ```

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use thiserror::Error;

use liveconfig_core::{LiveManager, TrackedObject};
use liveconfig_store::{FileHandler, SaveOutcome};

const HELP: &str = "\
commands:
  classes                          list classes and instance counts
  instances <class>                list instances of a class
  show [<instance>]                attributes of one or every instance
  get <instance> <attr>            print one attribute
  set <instance> <attr> <value>    update an attribute
  save                             write current state to the save file
  help                             this text
  quit | exit                      leave the shell";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Classes,
    Instances { class: String },
    Show { instance: Option<String> },
    Get { instance: String, attr: String },
    Set { instance: String, attr: String, raw: String },
    Save,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let Some((word, rest)) = next_token(line) else {
            return Ok(None);
        };
        let command = match word {
            "classes" => Command::Classes,
            "instances" => match next_token(rest) {
                Some((class, _)) => Command::Instances { class: class.to_owned() },
                None => return Err(ParseError::Usage("instances <class>")),
            },
            "show" => Command::Show {
                instance: next_token(rest).map(|(name, _)| name.to_owned()),
            },
            "get" => {
                let (instance, rest) = next_token(rest).ok_or(ParseError::Usage("get <instance> <attr>"))?;
                let (attr, _) = next_token(rest).ok_or(ParseError::Usage("get <instance> <attr>"))?;
                Command::Get {
                    instance: instance.to_owned(),
                    attr: attr.to_owned(),
                }
            }
            "set" => {
                const USAGE: &str = "set <instance> <attr> <value>";
                let (instance, rest) = next_token(rest).ok_or(ParseError::Usage(USAGE))?;
                let (attr, rest) = next_token(rest).ok_or(ParseError::Usage(USAGE))?;
                let raw = rest.trim();
                if raw.is_empty() {
                    return Err(ParseError::Usage(USAGE));
                }
                Command::Set {
                    instance: instance.to_owned(),
                    attr: attr.to_owned(),
                    raw: raw.to_owned(),
                }
            }
            "save" => Command::Save,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_owned())),
        };
        Ok(Some(command))
    }
}

/// Split off the first whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], s[end..].trim_start())),
        None => Some((s, "")),
    }
}

/// Result of executing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to show; keep reading.
    Output(String),
    /// Leave the shell.
    Quit,
}

/// Command interpreter bound to a manager and, optionally, a save file.
pub struct Shell<'a> {
    manager: &'a mut LiveManager,
    handler: Option<&'a mut FileHandler>,
}

impl<'a> Shell<'a> {
    pub fn new(manager: &'a mut LiveManager) -> Self {
        Self {
            manager,
            handler: None,
        }
    }

    /// Enable `save` through `handler`.
    pub fn with_file_handler(mut self, handler: &'a mut FileHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn execute(&mut self, line: &str) -> Outcome {
        match Command::parse(line) {
            Ok(Some(Command::Quit)) => Outcome::Quit,
            Ok(Some(command)) => Outcome::Output(self.run_command(command)),
            Ok(None) => Outcome::Output(String::new()),
            Err(e) => Outcome::Output(e.to_string()),
        }
    }

    /// Read commands from `input` until EOF or `quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write!(output, "> ")?;
        output.flush()?;
        for line in input.lines() {
            match self.execute(&line?) {
                Outcome::Quit => break,
                Outcome::Output(text) if text.is_empty() => {}
                Outcome::Output(text) => writeln!(output, "{text}")?,
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    fn run_command(&mut self, command: Command) -> String {
        match command {
            Command::Classes => self.classes(),
            Command::Instances { class } => self.instances(&class),
            Command::Show { instance } => self.show(instance.as_deref()),
            Command::Get { instance, attr } => match self.manager.get_attr_by_name(&instance, &attr) {
                Some(value) => value.to_string(),
                None => format!("no attribute '{attr}' on '{instance}'"),
            },
            Command::Set { instance, attr, raw } => {
                if self.manager.set_attr_by_name(&instance, &attr, &raw) {
                    let value = self
                        .manager
                        .get_attr_by_name(&instance, &attr)
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    format!("{instance}.{attr} = {value}")
                } else {
                    format!("rejected: could not set {instance}.{attr} to '{raw}'")
                }
            }
            Command::Save => self.save(),
            Command::Help => HELP.to_owned(),
            Command::Quit => String::new(),
        }
    }

    fn classes(&self) -> String {
        let lines: Vec<String> = self
            .manager
            .classes()
            .map(|class| {
                let count = self
                    .manager
                    .get_instances_of(&class.name.0)
                    .map_or(0, |i| i.len());
                format!("{} ({count} instance(s))", class.name)
            })
            .collect();
        if lines.is_empty() {
            "no classes registered".to_owned()
        } else {
            lines.join("\n")
        }
    }

    fn instances(&self, class: &str) -> String {
        match self.manager.get_instances_of(class) {
            None => format!("unknown class '{class}'"),
            Some(instances) if instances.is_empty() => format!("no instances of '{class}'"),
            Some(instances) => instances
                .iter()
                .map(|(name, _)| name.0.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn show(&self, instance: Option<&str>) -> String {
        match instance {
            Some(name) => match self.manager.get_instance(name) {
                Some(object) => describe(name, object),
                None => format!("unknown instance '{name}'"),
            },
            None => {
                let blocks: Vec<String> = self
                    .manager
                    .instances()
                    .map(|(name, object)| describe(&name.0, object))
                    .collect();
                if blocks.is_empty() {
                    "no instances registered".to_owned()
                } else {
                    blocks.join("\n")
                }
            }
        }
    }

    fn save(&mut self) -> String {
        let Some(handler) = self.handler.as_deref_mut() else {
            return "no save file configured".to_owned();
        };
        match handler.save_manager(self.manager) {
            Ok(SaveOutcome::Written { path }) => format!("saved to {}", path.display()),
            Ok(SaveOutcome::Unchanged { path }) => format!("{} already up to date", path.display()),
            Err(e) => format!("save failed: {e}"),
        }
    }
}

fn describe(name: &str, object: &TrackedObject) -> String {
    let mut out = format!("{name} [{}]", object.class());
    for (attr, value) in object.tracked_attrs() {
        let _ = write!(out, "\n  {attr} = {value}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveconfig_core::{TrackedClass, Value};

    fn manager() -> LiveManager {
        let mut manager = LiveManager::new();
        let class = manager
            .register_class(
                TrackedClass::new("Light")
                    .with_default("on", false)
                    .with_default("level", 3)
                    .with_default("colour", Value::Tuple(vec![Value::Int(255); 3])),
            )
            .clone();
        manager.register_instance("lamp", class.instantiate()).expect("register");
        manager.register_class(TrackedClass::new("Door"));
        manager
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Output(text) => text,
            Outcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parse_set_keeps_rest_of_line() {
        assert_eq!(
            Command::parse("  set lamp colour (1, 2,  3) ").unwrap(),
            Some(Command::Set {
                instance: "lamp".into(),
                attr: "colour".into(),
                raw: "(1, 2,  3)".into()
            })
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(matches!(Command::parse("fly"), Err(ParseError::Unknown(_))));
        assert!(matches!(Command::parse("set lamp on"), Err(ParseError::Usage(_))));
        assert!(matches!(Command::parse("get lamp"), Err(ParseError::Usage(_))));
        assert!(matches!(Command::parse("instances"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn set_then_get() {
        let mut m = manager();
        let mut shell = Shell::new(&mut m);
        assert_eq!(output(shell.execute("set lamp on yes")), "lamp.on = true");
        assert_eq!(output(shell.execute("get lamp on")), "true");
        assert!(output(shell.execute("set lamp level high")).starts_with("rejected"));
        assert_eq!(output(shell.execute("get lamp level")), "3");
    }

    #[test]
    fn listing_commands() {
        let mut m = manager();
        let mut shell = Shell::new(&mut m);
        let classes = output(shell.execute("classes"));
        assert!(classes.contains("Light (1 instance(s))"));
        assert!(classes.contains("Door (0 instance(s))"));
        assert_eq!(output(shell.execute("instances Light")), "lamp");
        assert_eq!(output(shell.execute("instances Door")), "no instances of 'Door'");
        assert_eq!(output(shell.execute("instances Window")), "unknown class 'Window'");
        let shown = output(shell.execute("show lamp"));
        assert!(shown.starts_with("lamp [Light]"));
        assert!(shown.contains("colour = (255, 255, 255)"));
    }

    #[test]
    fn save_without_handler() {
        let mut m = manager();
        let mut shell = Shell::new(&mut m);
        assert_eq!(output(shell.execute("save")), "no save file configured");
    }

    #[test]
    fn run_stops_at_quit() {
        let mut m = manager();
        let input = b"set lamp level 7\nquit\nset lamp level 9\n";
        let mut out = Vec::new();
        Shell::new(&mut m).run(&input[..], &mut out).expect("run");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("lamp.level = 7"));
        assert_eq!(m.get_attr_by_name("lamp", "level"), Some(&Value::Int(7)));
    }

    #[test]
    fn save_through_handler() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("state.json");
        let mut handler = FileHandler::open(&path).expect("open");
        let mut m = manager();
        let mut shell = Shell::new(&mut m).with_file_handler(&mut handler);
        shell.execute("set lamp level 5");
        assert!(output(shell.execute("save")).starts_with("saved to"));
        assert!(output(shell.execute("save")).ends_with("already up to date"));
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"level\": 5"));
    }
}
