//! Shell command parsing and execution.
//!
//! Commands:
//! - `store <file> <size> [data]` - create a file holding `data`
//! - `retrieve <file>` - print a file
//! - `erase <file>` - delete a file
//! - `files` - list files, repairing the directory count if needed
//! - `freespace` - largest free run in the filesystem
//! - `import <file> <host-path>` - load a compiled program from the host
//! - `wipe` - erase the whole filesystem
//! - `run <file>` - start a process
//! - `list` - list processes
//! - `suspend|resume|kill <id>` - change a process's state
//! - `tick [n]` - run scheduler passes
//! - `help`, `exit`

use std::path::PathBuf;

use arduinos_fs::{FsError, PersistentStore};
use arduinos_kernel::{Console, Hal, Kernel, ProcessId, ProcessState};
use nu_ansi_term::{Color, Style};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Store {
        name: String,
        size: usize,
        data: String,
    },
    Retrieve(String),
    Erase(String),
    Files,
    FreeSpace,
    Import {
        name: String,
        path: PathBuf,
    },
    Wipe,
    Run(String),
    List,
    Suspend(ProcessId),
    Resume(ProcessId),
    Kill(ProcessId),
    Tick(usize),
    Exit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(input: &str) -> Result<Option<Command>, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let (command, args) = match input.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim_start()),
            None => (input, ""),
        };

        let command = match command.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            "store" => {
                let (name, rest) = split_arg(args).ok_or("usage: store <file> <size> [data]")?;
                let (size, data) = split_arg(rest).ok_or("usage: store <file> <size> [data]")?;
                let size = size
                    .parse()
                    .map_err(|_| format!("invalid size: '{size}'"))?;
                Command::Store {
                    name: name.to_string(),
                    size,
                    data: data.to_string(),
                }
            }
            "retrieve" => Command::Retrieve(one_arg(args, "usage: retrieve <file>")?),
            "erase" => Command::Erase(one_arg(args, "usage: erase <file>")?),
            "files" => Command::Files,
            "freespace" => Command::FreeSpace,
            "import" => {
                let (name, path) =
                    split_arg(args).ok_or("usage: import <file> <host-path>")?;
                if path.is_empty() {
                    return Err("usage: import <file> <host-path>".into());
                }
                Command::Import {
                    name: name.to_string(),
                    path: PathBuf::from(path.trim()),
                }
            }
            "wipe" => Command::Wipe,
            "run" => Command::Run(one_arg(args, "usage: run <file>")?),
            "list" => Command::List,
            "suspend" => Command::Suspend(parse_pid(args)?),
            "resume" => Command::Resume(parse_pid(args)?),
            "kill" => Command::Kill(parse_pid(args)?),
            "tick" => {
                let passes = if args.is_empty() {
                    1
                } else {
                    args.parse()
                        .map_err(|_| format!("invalid tick count: '{args}'"))?
                };
                Command::Tick(passes)
            }
            other => {
                return Err(format!(
                    "command not known: '{other}'. Enter 'help' for help."
                ))
            }
        };
        Ok(Some(command))
    }
}

/// Outcome of a command.
#[derive(Debug)]
pub enum CommandResult {
    Ok { display: Option<String> },
    Error(String),
    Exit,
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok {
            display: Some(display.into()),
        }
    }

    fn ok_none() -> Self {
        CommandResult::Ok { display: None }
    }
}

/// Parse and execute a command line against the kernel.
pub fn execute<S, H, C>(input: &str, kernel: &mut Kernel<S, H, C>) -> CommandResult
where
    S: PersistentStore,
    H: Hal,
    C: Console,
{
    match Command::parse(input) {
        Ok(Some(command)) => run(command, kernel),
        Ok(None) => CommandResult::ok_none(),
        Err(msg) => CommandResult::Error(msg),
    }
}

fn run<S, H, C>(command: Command, kernel: &mut Kernel<S, H, C>) -> CommandResult
where
    S: PersistentStore,
    H: Hal,
    C: Console,
{
    let result = match command {
        Command::Help => return CommandResult::Help,
        Command::Exit => return CommandResult::Exit,
        Command::Store { name, size, data } => kernel
            .fs_mut()
            .create(&name, size, data.as_bytes())
            .map(|_| "file stored successfully".to_string())
            .map_err(|e| e.to_string()),
        Command::Retrieve(name) => cmd_retrieve(&name, kernel),
        Command::Erase(name) => kernel
            .erase(&name)
            .map(|_| format!("{name} erased successfully"))
            .map_err(|e| e.to_string()),
        Command::Files => cmd_files(kernel),
        Command::FreeSpace => Ok(format!("{} byte(s) free", kernel.fs().free_space())),
        Command::Import { name, path } => cmd_import(&name, &path, kernel),
        Command::Wipe => kernel
            .wipe()
            .map(|()| "Memory wiped.\nTry 'files' to view all files.".to_string())
            .map_err(|e| e.to_string()),
        Command::Run(name) => kernel
            .spawn(&name)
            .map(|pid| format!("started process {pid}"))
            .map_err(|e| e.to_string()),
        Command::List => Ok(cmd_list(kernel)),
        Command::Suspend(pid) => kernel
            .suspend(pid)
            .map(|()| format!("process {pid} suspended"))
            .map_err(|e| e.to_string()),
        Command::Resume(pid) => kernel
            .resume(pid)
            .map(|()| format!("process {pid} resumed"))
            .map_err(|e| e.to_string()),
        Command::Kill(pid) => kernel
            .kill(pid)
            .map(|()| format!("process {pid} killed"))
            .map_err(|e| e.to_string()),
        Command::Tick(passes) => {
            let report = kernel.run_ticks(passes);
            Ok(format!("{} step(s) executed", report.executed))
        }
    };

    match result {
        Ok(display) => CommandResult::ok_display(display),
        Err(msg) => CommandResult::Error(msg),
    }
}

fn cmd_retrieve<S: PersistentStore, H: Hal, C: Console>(
    name: &str,
    kernel: &mut Kernel<S, H, C>,
) -> Result<String, String> {
    let bytes = kernel.fs_mut().read(name).map_err(|e| e.to_string())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cmd_files<S: PersistentStore, H: Hal, C: Console>(
    kernel: &mut Kernel<S, H, C>,
) -> Result<String, String> {
    let header = Style::new().bold();
    let mut out = String::new();

    if let Some(repair) = kernel.fs_mut().repair().map_err(|e| e.to_string())? {
        out.push_str(&format!(
            "{}\n",
            Color::Yellow.paint(FsError::from(repair).to_string())
        ));
    }

    out.push_str(&format!(
        "{}\n",
        header.paint(format!("  {:<12} {:>6} {:>6}", "name", "start", "size"))
    ));
    let files = kernel.fs().list();
    for record in files {
        out.push_str(&format!(
            "  {:<12} {:>6} {:>6}\n",
            record.name(),
            record.start(),
            record.size()
        ));
    }
    out.push_str(&format!("{} result(s)", files.len()));
    Ok(out)
}

fn cmd_import<S: PersistentStore, H: Hal, C: Console>(
    name: &str,
    path: &std::path::Path,
    kernel: &mut Kernel<S, H, C>,
) -> Result<String, String> {
    let image =
        std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    kernel
        .fs_mut()
        .create(name, image.len(), &image)
        .map_err(|e| e.to_string())?;
    Ok(format!("imported {} byte(s) into {name}", image.len()))
}

fn cmd_list<S: PersistentStore, H: Hal, C: Console>(kernel: &Kernel<S, H, C>) -> String {
    let header = Style::new().bold();
    let procs = kernel.list();
    let mut out = format!(
        "{}\n",
        header.paint(format!("  {:>5} {:<12} {}", "id", "name", "state"))
    );
    for p in &procs {
        let state = match p.state {
            ProcessState::Running => Color::Green.paint(p.state.to_string()),
            ProcessState::Paused => Color::Yellow.paint(p.state.to_string()),
            ProcessState::Terminated => Color::DarkGray.paint(p.state.to_string()),
        };
        out.push_str(&format!("  {:>5} {:<12} {}\n", p.id, p.name, state));
    }
    out.push_str(&format!("{} result(s)", procs.len()));
    out
}

/// Split off the first whitespace-separated word.
fn split_arg(args: &str) -> Option<(&str, &str)> {
    if args.is_empty() {
        return None;
    }
    Some(match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest),
        None => (args, ""),
    })
}

fn one_arg(args: &str, usage: &str) -> Result<String, String> {
    match args.split_whitespace().collect::<Vec<_>>().as_slice() {
        [one] => Ok(one.to_string()),
        _ => Err(usage.to_string()),
    }
}

fn parse_pid(args: &str) -> Result<ProcessId, String> {
    let id = one_arg(args, "expected a process id")?;
    id.parse()
        .map(ProcessId)
        .map_err(|_| format!("invalid process id: '{id}'"))
}

/// Help text.
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = format!("{}\n\n", Style::new().bold().paint("ArduinOS commands"));

    let commands = [
        ("store", "<file> <size> [data]", "Create a file and put data in it"),
        ("retrieve", "<file>", "Print the contents of a file"),
        ("erase", "<file>", "Delete a file"),
        ("files", "", "List all files"),
        ("freespace", "", "Largest free block in the filesystem"),
        ("import", "<file> <host-path>", "Store a compiled program from the host"),
        ("wipe", "", "Erase the whole filesystem"),
        ("", "", ""),
        ("run", "<file>", "Start the program in a file"),
        ("list", "", "List all processes"),
        ("suspend", "<id>", "Pause a process"),
        ("resume", "<id>", "Continue a paused process"),
        ("kill", "<id>", "Stop a process"),
        ("tick", "[n]", "Run n scheduler passes (default 1)"),
        ("", "", ""),
        ("help", "", "Show this help message"),
        ("exit", "", "Leave the shell (alias: quit)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<10} {:<20} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc
            ));
        }
    }

    help
}

#[cfg(test)]
mod tests {
    use arduinos_eeprom::MemoryEeprom;
    use arduinos_fs::FileTable;
    use arduinos_kernel::{BufferConsole, KernelConfig, Opcode, SimulatedHal};

    use super::*;

    type TestKernel = Kernel<MemoryEeprom, SimulatedHal, BufferConsole>;

    fn kernel() -> TestKernel {
        let fs = FileTable::mount(MemoryEeprom::default()).unwrap();
        Kernel::new(
            fs,
            SimulatedHal::with_manual_clock(),
            BufferConsole::new(),
            KernelConfig::default(),
        )
    }

    fn display(result: CommandResult) -> String {
        match result {
            CommandResult::Ok { display } => display.unwrap_or_default(),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    fn error(result: CommandResult) -> String {
        match result {
            CommandResult::Error(msg) => msg,
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn parse_store_keeps_data_verbatim() {
        assert_eq!(
            Command::parse("store note 20 hello  world").unwrap(),
            Some(Command::Store {
                name: "note".into(),
                size: 20,
                data: "hello  world".into(),
            })
        );
        assert_eq!(
            Command::parse("store empty 4").unwrap(),
            Some(Command::Store {
                name: "empty".into(),
                size: 4,
                data: String::new(),
            })
        );
    }

    #[test]
    fn parse_rejects_bad_arguments() {
        assert!(Command::parse("store x many").is_err());
        assert!(Command::parse("store").is_err());
        assert!(Command::parse("kill abc").is_err());
        assert!(Command::parse("kill").is_err());
        assert!(Command::parse("run a b").is_err());
        assert!(Command::parse("import prog").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("FILES").unwrap(), Some(Command::Files));
        assert_eq!(Command::parse("tick").unwrap(), Some(Command::Tick(1)));
        assert_eq!(Command::parse("tick 10").unwrap(), Some(Command::Tick(10)));
        assert_eq!(
            Command::parse("resume 3").unwrap(),
            Some(Command::Resume(ProcessId(3)))
        );
        assert_eq!(
            Command::parse("import blink /tmp/blink.bin").unwrap(),
            Some(Command::Import {
                name: "blink".into(),
                path: PathBuf::from("/tmp/blink.bin"),
            })
        );
    }

    #[test]
    fn store_retrieve_erase() {
        let mut k = kernel();
        assert_eq!(
            display(execute("store a 5 hello", &mut k)),
            "file stored successfully"
        );
        assert_eq!(display(execute("retrieve a", &mut k)), "hello");
        assert!(error(execute("store a 5 again", &mut k)).contains("exists"));

        assert_eq!(display(execute("erase a", &mut k)), "a erased successfully");
        assert!(error(execute("retrieve a", &mut k)).contains("not found"));
    }

    #[test]
    fn files_lists_with_footer() {
        let mut k = kernel();
        execute("store one 3 abc", &mut k);
        execute("store two 2 xy", &mut k);

        let out = display(execute("files", &mut k));
        assert!(out.contains("one"));
        assert!(out.contains("two"));
        assert!(out.ends_with("2 result(s)"));
    }

    #[test]
    fn files_reports_repair() {
        let mut k = kernel();
        execute("store one 3 abc", &mut k);
        k.fs_mut().store_mut().write_byte(0, 4).unwrap();

        let out = display(execute("files", &mut k));
        assert!(out.contains("directory correction made"));
        assert!(out.ends_with("1 result(s)"));
    }

    #[test]
    fn freespace_shrinks_after_store() {
        let mut k = kernel();
        let before = k.fs().free_space();
        execute("store a 10", &mut k);
        assert_eq!(
            display(execute("freespace", &mut k)),
            format!("{} byte(s) free", before - 10)
        );
    }

    #[test]
    fn process_commands() {
        let mut k = kernel();
        let program = [Opcode::Loop as u8, Opcode::EndLoop as u8];
        k.fs_mut().create("spin", program.len(), &program).unwrap();

        assert_eq!(display(execute("run spin", &mut k)), "started process 0");
        assert!(display(execute("list", &mut k)).contains("RUNNING"));
        assert_eq!(display(execute("suspend 0", &mut k)), "process 0 suspended");
        assert!(error(execute("suspend 0", &mut k)).contains("PAUSED"));
        assert_eq!(display(execute("resume 0", &mut k)), "process 0 resumed");
        assert_eq!(display(execute("kill 0", &mut k)), "process 0 killed");
        assert!(display(execute("list", &mut k)).contains("TERMINATED"));
        assert!(error(execute("kill 7", &mut k)).contains("not found"));
    }

    #[test]
    fn erase_refuses_running_program() {
        let mut k = kernel();
        let program = [Opcode::Loop as u8, Opcode::EndLoop as u8];
        k.fs_mut().create("spin", program.len(), &program).unwrap();
        execute("run spin", &mut k);

        assert!(error(execute("erase spin", &mut k)).contains("in use by process 0"));
        assert!(k.fs().find("spin").is_ok());

        execute("kill 0", &mut k);
        assert_eq!(display(execute("erase spin", &mut k)), "spin erased successfully");
    }

    #[test]
    fn wipe_kills_processes_and_formats() {
        let mut k = kernel();
        let program = [Opcode::Loop as u8, Opcode::EndLoop as u8];
        k.fs_mut().create("spin", program.len(), &program).unwrap();
        execute("run spin", &mut k);

        assert!(display(execute("wipe", &mut k)).starts_with("Memory wiped."));
        assert!(k.fs().is_empty());
        assert!(k
            .list()
            .iter()
            .all(|p| p.state == ProcessState::Terminated));
    }

    #[test]
    fn tick_runs_scheduler() {
        let mut k = kernel();
        let program = [Opcode::Char as u8, b'!', Opcode::Print as u8];
        k.fs_mut().create("bang", program.len(), &program).unwrap();
        execute("run bang", &mut k);

        assert_eq!(display(execute("tick 2", &mut k)), "2 step(s) executed");
        assert_eq!(k.console().contents(), "!");
    }

    #[test]
    fn help_lists_every_command() {
        let help = format_help();
        for cmd in [
            "store", "retrieve", "erase", "files", "freespace", "import", "wipe", "run", "list",
            "suspend", "resume", "kill", "tick", "help", "exit",
        ] {
            assert!(help.contains(cmd), "missing {cmd}");
        }
    }
}
