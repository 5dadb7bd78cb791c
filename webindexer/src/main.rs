use tracing_subscriber::EnvFilter;
use webindexer::commands::args::Args;
use webindexer::commands::command_handler::handle_command;
use webindexer::config::Config;
use webindexer::error::{ConfigErrorKind, IndexerError, Result};

fn main() {
    init_logging();
    if let Err(e) = run() {
        print_error(&e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("webindexer=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let args = Args::parse()?;
    if args.no_color {
        colored::control::set_override(false);
    }

    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(Config::get_config_path);
    let config = Config::load(&config_path)?;
    handle_command(&args, config, &config_path)
}

fn print_error(error: &IndexerError) {
    use colored::Colorize;

    let error_type = match error {
        IndexerError::Io(_) => "IO Error",
        IndexerError::Parse(_) => "Parse Error",
        IndexerError::Config(ConfigErrorKind::InvalidPath(_)) => "Path Error",
        IndexerError::Config(_) => "Config Error",
        IndexerError::Filter(_) => "Filter Error",
        IndexerError::Image(_) => "Image Error",
        IndexerError::Other(_) => "Error",
    };

    eprintln!();
    eprintln!("{} {}", "✗".bright_red(), error_type.bright_red().bold());
    eprintln!();

    for line in error.to_string().lines() {
        eprintln!("  {}", line);
    }
    eprintln!();
}
