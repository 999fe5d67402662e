use reedline::{Completer, Span, Suggestion};

/// Shell commands with a one-line description each.
pub(crate) const COMMANDS: &[(&str, &str)] = &[
    ("help", "Show help"),
    ("store", "Create a file"),
    ("retrieve", "Print a file"),
    ("erase", "Delete a file"),
    ("files", "List files"),
    ("freespace", "Largest free block"),
    ("import", "Store a program from the host"),
    ("wipe", "Erase the filesystem"),
    ("run", "Start a program"),
    ("list", "List processes"),
    ("suspend", "Pause a process"),
    ("resume", "Continue a process"),
    ("kill", "Stop a process"),
    ("tick", "Run scheduler passes"),
    ("exit", "Leave the shell"),
    ("quit", "Leave the shell"),
];

/// Completes the command word.
#[derive(Debug, Default)]
pub struct ShellCompleter;

impl ShellCompleter {
    pub fn new() -> Self {
        Self
    }
}

impl Completer for ShellCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let typed = &line[..pos];
        let prefix = typed.trim_start();
        if prefix.contains(char::is_whitespace) {
            return Vec::new();
        }
        let start = typed.len() - prefix.len();

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(prefix))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}
