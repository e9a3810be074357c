use std::{
    fs,
    io::{self, BufRead, Write as _},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};
use zen::{Builtins, ExecError, Interpreter, ReplSession, StdPrint};

/// Longest REPL input line accepted, in bytes.
const MAX_REPL_INPUT: usize = 8192;

#[derive(Parser, Debug)]
#[command(name = "zen", version, about = "The Zen scripting language")]
struct Cli {
    /// Script to execute (`.zen` or `.zn`); omit to start the REPL.
    file: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(long)]
    debug: bool,

    /// Enable info-level logging.
    #[arg(long)]
    verbose: bool,

    /// Disable all logging.
    #[arg(long)]
    silent: bool,

    /// Redirect logs to a file.
    #[arg(long, value_name = "path")]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = if args.silent {
        LevelFilter::Off
    } else if args.debug {
        LevelFilter::Debug
    } else if args.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    if let Err(err) = init_logging(level, args.log_file.as_deref()) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match args.file {
        Some(file) => run_file(&file),
        None => run_repl(),
    }
}

fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), String> {
    match log_file {
        Some(path) => {
            let file = fs::File::create(path).map_err(|err| format!("cannot open log file {}: {err}", path.display()))?;
            log::set_boxed_logger(Box::new(FileLogger { file: Mutex::new(file) }))
                .map_err(|err| err.to_string())?;
            log::set_max_level(level);
            Ok(())
        }
        None => simple_logger::SimpleLogger::new()
            .with_level(level)
            .init()
            .map_err(|err| err.to_string()),
    }
}

/// Minimal `log::Log` sink writing one line per record to a file.
struct FileLogger {
    file: Mutex<fs::File>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        let mut file = self.file.lock().expect("log file lock poisoned");
        let _ = writeln!(file, "{:<5} [{}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

fn run_file(path: &Path) -> ExitCode {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("zen" | "zn") => {}
        _ => {
            eprintln!("error: {} is not a .zen or .zn file", path.display());
            return ExitCode::FAILURE;
        }
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    log::info!("executing {}", path.display());
    let mut interp = Interpreter::new();
    match interp.run(&source, &mut StdPrint) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl() -> ExitCode {
    println!("zen {} - type 'help' for help, 'exit' to leave", env!("CARGO_PKG_VERSION"));
    let mut session = ReplSession::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("zen> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }
        if line.len() > MAX_REPL_INPUT {
            eprintln!("error: input longer than {MAX_REPL_INPUT} bytes");
            continue;
        }

        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "clear" => {
                // ANSI clear screen and home
                print!("\x1b[2J\x1b[1;1H");
                let _ = io::stdout().flush();
                continue;
            }
            "help" => {
                print_help(&session);
                continue;
            }
            _ => {}
        }

        match session.execute(input, &mut StdPrint) {
            Ok(result) => {
                if let Some(rendered) = ReplSession::render_result(&result) {
                    println!("{rendered}");
                }
            }
            Err(err @ ExecError::Syntax(_)) => eprintln!("{err}"),
            Err(ExecError::Runtime(err)) => eprintln!("{err}"),
        }
    }
    ExitCode::SUCCESS
}

fn print_help(session: &ReplSession) {
    println!("commands: exit, quit, clear, help");
    println!("variables defined: {}", session.list_variables().len());
    println!("builtins ({}):", Builtins::count());
    for builtin in Builtins::iter() {
        println!("  {:<14} {}", builtin.name(), builtin.description());
    }
}
