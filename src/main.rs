// brackc: bracket-headed C-like language to LLVM-style IR

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    style::Stylize,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};

use brackc::parser::lexer::{Lexer, Token};
use brackc::ui::App;

#[derive(Parser)]
#[command(name = "brackc", version, about = "Compile bracket-headed C-like source to IR")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file and write the IR
    Build {
        /// Source file to compile
        file: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the token stream with line numbers
    Tokens {
        /// Source file to tokenise
        file: PathBuf,
    },
    /// Show the source next to its IR in a terminal view
    Inspect {
        /// Source file to inspect
        file: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build { file, output } => build(&file, output.as_deref()),
        Command::Tokens { file } => tokens(&file),
        Command::Inspect { file } => inspect(&file),
    };

    if let Err(message) = result {
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn read_source(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("cannot read '{}': {}", file.display(), e))
}

fn build(file: &Path, output: Option<&Path>) -> Result<(), String> {
    let source = read_source(file)?;

    info!("compiling {}", file.display());
    let ir = brackc::compile(&source).map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            fs::write(path, &ir)
                .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
            info!("wrote {} byte(s) to {}", ir.len(), path.display());
        }
        None => print!("{}", ir),
    }
    Ok(())
}

fn tokens(file: &Path) -> Result<(), String> {
    let source = read_source(file)?;
    let mut lexer = Lexer::new(&source);

    info!("tokenising {}", file.display());
    loop {
        let token = lexer
            .next_token()
            .map_err(|e| format!("{} near line {}", e.message, e.line))?;
        if token == Token::Eof {
            break;
        }
        println!("{:4}  {}", lexer.line(), token);
    }
    info!("{} distinct word(s)", lexer.word_count());
    Ok(())
}

fn inspect(file: &Path) -> Result<(), String> {
    let source = read_source(file)?;
    let mut app = App::new(file.display().to_string(), source);

    run_terminal(&mut app).map_err(|e| format!("terminal error: {}", e))
}

fn run_terminal(app: &mut App) -> io::Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}
