use calcshell::{config::Config, error::CalcResult, operations::OperationRegistry, shell::Shell};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::OpenOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "calcshell")]
#[command(about = "An interactive calculator with undoable, persistent history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run a single command and exit
    #[arg(short = 'c', long)]
    command_string: Option<String>,

    /// Execute a script file, one command per line
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Start in REPL mode (default)
    #[arg(long)]
    repl: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
    /// Check configuration and history files
    Doctor,
    /// Show the effective configuration
    Config,
    /// Delete the persisted calculation history
    ClearHistory,
    /// List available operations
    Operations,
}

#[tokio::main]
async fn main() -> CalcResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).await?;

    init_logging(&config, cli.verbose)?;
    info!("Starting calculator v{}", env!("CARGO_PKG_VERSION"));

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(command, &config).await;
    }

    let mut shell = Shell::new(config).await?;

    match (cli.command_string, cli.script, cli.repl) {
        (Some(cmd), None, false) => {
            let output = shell.execute_command(&cmd)?;
            let text = output.to_display_string(shell.config().calculator.precision);
            if !text.is_empty() {
                println!("{}", text);
            }
            shell.report_warnings();
        }
        (None, Some(script_path), false) => {
            shell.execute_script(&script_path).await?;
        }
        _ => {
            shell.run_repl()?;
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> CalcResult<()> {
    let log_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));

    if config.logging.log_to_file {
        std::fs::create_dir_all(&config.paths.log_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_file())?;
        builder
            .target(env_logger::Target::Pipe(Box::new(file)))
            .write_style(env_logger::WriteStyle::Never);
    }

    builder.init();
    Ok(())
}

async fn handle_command(command: Commands, config: &Config) -> CalcResult<()> {
    match command {
        Commands::Init { force } => {
            let path = config.init(force).await?;
            println!("✓ Configuration initialized at {}", path.display());
        }
        Commands::Doctor => {
            config.doctor().await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Commands::ClearHistory => {
            config.clear_history().await?;
            println!("✓ Calculation history cleared");
        }
        Commands::Operations => {
            for (name, op) in OperationRegistry::with_builtins().iter() {
                println!("{:12} {:9} {}", name, op.symbol(), op.description());
            }
        }
    }
    Ok(())
}
