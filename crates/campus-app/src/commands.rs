//! Parsing of interactive terminal input.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(String),
    Theme,
    Panel,
    Speak(usize),
    Stop,
    Hotspot(String),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
Type a question, or one of:
  /theme          toggle light/dark
  /panel          collapse or expand the chat panel
  /speak N        read message N aloud
  /stop           stop speaking
  /hotspot NAME   click a hotspot
  /quit           exit";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Query(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name.to_ascii_lowercase().as_str() {
            "theme" => Command::Theme,
            "panel" => Command::Panel,
            "stop" => Command::Stop,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "speak" => match arg.parse::<usize>() {
                Ok(index) => Command::Speak(index),
                Err(_) => Command::Invalid("usage: /speak N".to_string()),
            },
            "hotspot" if !arg.is_empty() => Command::Hotspot(arg.to_string()),
            "hotspot" => Command::Invalid("usage: /hotspot NAME".to_string()),
            other => Command::Invalid(format!("unknown command: /{}", other)),
        }
    }
}
