use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::completer::COMMANDS;

/// Colours the command word and its arguments.
#[derive(Debug, Default)]
pub struct ShellHighlighter;

impl ShellHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for ShellHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        if line.is_empty() {
            return styled;
        }

        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => line.split_at(pos),
            None => (line, ""),
        };

        let lower = command.to_lowercase();
        let known = COMMANDS.iter().any(|(cmd, _)| *cmd == lower) || lower == "?";
        let cmd_style = if known {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        match lower.as_str() {
            "suspend" | "resume" | "kill" | "tick" => {
                styled.push((Style::new().fg(Color::Cyan), rest.to_string()));
            }
            _ => styled.push((Style::new().fg(Color::Yellow), rest.to_string())),
        }

        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(styled: &StyledText) -> String {
        styled.buffer.iter().map(|(_, s)| s.as_str()).collect()
    }

    #[test]
    fn highlighting_keeps_text() {
        let h = ShellHighlighter::new();
        for line in ["store a 5 hello world", "run blink", "kill 3", "bogus x"] {
            assert_eq!(plain(&h.highlight(line, 0)), line);
        }
    }

    #[test]
    fn unknown_command_is_red() {
        let h = ShellHighlighter::new();
        let styled = h.highlight("bogus", 0);
        assert_eq!(styled.buffer[0].0, Style::new().fg(Color::Red));
    }
}
