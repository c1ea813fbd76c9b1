//! Parsing of composer lines typed on stdin.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send.
    Say(String),
    /// `/file <path> [caption]`
    File { path: PathBuf, caption: String },
    /// `/who`
    Who,
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
    Unknown(String),
}

impl Command {
    /// Lines that were typed as a message, which peers see as typing.
    pub fn is_composed(&self) -> bool {
        matches!(self, Command::Say(_) | Command::File { .. })
    }
}

pub const HELP: &str = "commands: /file <path> [caption], /who, /help, /quit";

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    // `//text` sends a message starting with a slash.
    if let Some(text) = line.strip_prefix("//") {
        return Some(Command::Say(format!("/{text}")));
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((rest, ""));
    let command = match name {
        "file" if !args.is_empty() => {
            let (path, caption) = args
                .split_once(char::is_whitespace)
                .map(|(p, c)| (p, c.trim()))
                .unwrap_or((args, ""));
            Command::File {
                path: PathBuf::from(path),
                caption: caption.to_string(),
            }
        }
        "who" => Command::Who,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   \t"), None);
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(parse_line("  hello there "), Some(Command::Say("hello there".into())));
    }

    #[test]
    fn double_slash_escapes() {
        assert_eq!(parse_line("//shrug"), Some(Command::Say("/shrug".into())));
    }

    #[test]
    fn file_with_and_without_caption() {
        assert_eq!(
            parse_line("/file ./cat.png look at this"),
            Some(Command::File {
                path: PathBuf::from("./cat.png"),
                caption: "look at this".into(),
            })
        );
        assert_eq!(
            parse_line("/file notes.txt"),
            Some(Command::File {
                path: PathBuf::from("notes.txt"),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn file_without_path_is_unknown() {
        assert_eq!(parse_line("/file"), Some(Command::Unknown("file".into())));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_line("/who"), Some(Command::Who));
        assert_eq!(parse_line("/help"), Some(Command::Help));
        assert_eq!(parse_line("/quit"), Some(Command::Quit));
        assert_eq!(parse_line("/exit"), Some(Command::Quit));
        assert_eq!(parse_line("/dance"), Some(Command::Unknown("dance".into())));
    }

    #[test]
    fn only_messages_count_as_typing() {
        let composed = |line: &str| parse_line(line).is_some_and(|c| c.is_composed());
        assert!(composed("hello"));
        assert!(composed("//shrug"));
        assert!(composed("/file cat.png"));
        assert!(!composed("/who"));
        assert!(!composed("/help"));
        assert!(!composed("/quit"));
        assert!(!composed("/dance"));
    }
}
