//! Terminal host implementation using Reedline.
//!
//! This host provides interactive terminal I/O with:
//! - Readline-style line editing (Vi and Emacs modes)
//! - Tab completion of command names
//! - Syntax highlighting
//! - Command history

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode, Emacs, KeyCode, KeyModifiers, MenuBuilder,
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal as ReedlineSignal, Vi,
};
use tracing::debug;

use crate::completer::ShellCompleter;
use crate::highlighter::ShellHighlighter;
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};
use crate::EditPreference;

const HISTORY_SIZE: usize = 1000;

/// Terminal host using Reedline for interactive I/O.
pub struct TerminalHost {
    line_editor: Reedline,
    pending_input: Option<InputLine>,
    pending_signal: Option<Signal>,
    current_prompt: PromptConfig,
}

impl TerminalHost {
    pub fn new(preference: EditPreference) -> io::Result<Self> {
        let completer = Box::new(ShellCompleter::new());
        let highlighter = Box::new(ShellHighlighter::new());
        let hinter = Box::new(
            DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
        );

        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );

        let use_vi = match preference {
            EditPreference::Vi => true,
            EditPreference::Emacs => false,
            EditPreference::Auto => should_use_vi_mode(),
        };
        let edit_mode: Box<dyn EditMode> = if use_vi {
            let mut insert_keybindings = default_vi_insert_keybindings();
            insert_keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab_completion());
            Box::new(Vi::new(insert_keybindings, default_vi_normal_keybindings()))
        } else {
            let mut keybindings = default_emacs_keybindings();
            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab_completion());
            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('d'),
                ReedlineEvent::Edit(vec![EditCommand::Clear]),
            );
            Box::new(Emacs::new(keybindings))
        };

        let mut line_editor = Reedline::create()
            .with_completer(completer)
            .with_highlighter(highlighter)
            .with_hinter(hinter)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        if let Some(history_path) = history_path() {
            if let Some(parent) = history_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match reedline::FileBackedHistory::with_file(HISTORY_SIZE, history_path) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => debug!(error = %e, "history disabled"),
            }
        }

        Ok(Self {
            line_editor,
            pending_input: None,
            pending_signal: None,
            current_prompt: PromptConfig::default(),
        })
    }
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt::from_config(&self.current_prompt);

        match self.line_editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => {
                self.pending_input = Some(InputLine { line });
            }
            Ok(ReedlineSignal::CtrlC) => {
                self.pending_signal = Some(Signal::Interrupt);
            }
            Ok(ReedlineSignal::CtrlD) => {
                self.pending_signal = Some(Signal::Eof);
            }
            Err(e) => {
                return Err(IoError::Io(format!("Reedline error: {}", e)));
            }
        }

        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.pending_input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.pending_signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let styled = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => {
                format!("{} {}", Color::Red.bold().paint("Error:"), output.text)
            }
            OutputStyle::Info | OutputStyle::Banner => {
                Color::Cyan.paint(&output.text).to_string()
            }
            // Programs may print partial lines; finish the line so the next
            // prompt starts on its own.
            OutputStyle::Program => {
                let mut text = output.text;
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                print!("{}", text);
                return Ok(());
            }
        };
        println!("{}", styled);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.current_prompt = config;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush().map_err(|e| IoError::Io(e.to_string()))
    }
}

fn tab_completion() -> ReedlineEvent {
    ReedlineEvent::UntilFound(vec![
        ReedlineEvent::Menu("completion_menu".to_string()),
        ReedlineEvent::MenuNext,
    ])
}

/// Prompt implementation for the terminal.
struct TerminalPrompt {
    running: usize,
    free_space: usize,
}

impl TerminalPrompt {
    fn from_config(config: &PromptConfig) -> Self {
        Self {
            running: config.running,
            free_space: config.free_space,
        }
    }
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let procs = if self.running == 0 {
            Color::Yellow.paint("idle").to_string()
        } else {
            Color::Blue
                .bold()
                .paint(format!("{} running", self.running))
                .to_string()
        };
        Cow::Owned(format!(
            "{} {} {}",
            Color::Green.bold().paint("arduinos"),
            procs,
            Color::Yellow.paint(format!("{}B free", self.free_space))
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => {
                Cow::Owned(format!("{} ", Color::Green.bold().paint(">")))
            }
            PromptEditMode::Vi(vi_mode) => {
                let indicator = match vi_mode {
                    reedline::PromptViMode::Normal => Color::Blue.bold().paint("[N]>"),
                    reedline::PromptViMode::Insert => Color::Green.bold().paint("[I]>"),
                };
                Cow::Owned(format!("{} ", indicator))
            }
            PromptEditMode::Custom(s) => Cow::Owned(format!("({})> ", s)),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("arduinos").join("history.txt"))
}

fn is_vi(editor: &str) -> bool {
    let editor = editor.to_lowercase();
    editor.contains("vim") || editor == "vi" || editor.ends_with("/vi")
}

/// Pick vi mode from the environment when no preference was given.
fn should_use_vi_mode() -> bool {
    // Explicit override wins over everything else.
    if let Ok(mode) = std::env::var("ARDUINOS_EDIT_MODE") {
        let mode = mode.to_lowercase();
        return mode == "vi" || mode == "vim";
    }

    for var in ["EDITOR", "VISUAL"] {
        if std::env::var(var).is_ok_and(|editor| is_vi(&editor)) {
            return true;
        }
    }

    check_inputrc_vi_mode()
}

/// Check .inputrc for `set editing-mode vi`.
fn check_inputrc_vi_mode() -> bool {
    let inputrc_paths = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    inputrc_paths
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| content.lines().any(sets_vi_mode))
}

fn sets_vi_mode(line: &str) -> bool {
    let mut words = line.split_whitespace();
    words.next() == Some("set")
        && words.next() == Some("editing-mode")
        && words.next() == Some("vi")
}
