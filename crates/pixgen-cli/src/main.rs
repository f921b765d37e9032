use clap::{Parser, Subcommand};
use pixgen::{
    commands::{
        config::{self, ConfigAction},
        docs::{self, DocsCommand},
        expand::{self, ExpandCommand},
        generate::{self, GenerateCommand},
        list::{self, ListCommand},
    },
    GlobalOpts,
};
use pixgen_logger as logger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pixgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Plugin wrapper generator",
    long_about = "pixgen generates native CPython wrappers, build descriptors and reference docs for pixel-typed image plugins."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate wrapper sources for plugin declarations
    Generate(GenerateCommand),
    /// Render reStructuredText reference docs
    Docs(DocsCommand),
    /// List declared modules and functions
    List(ListCommand),
    /// Print the concrete variants a set of pixel types dispatches over
    Expand(ExpandCommand),
    /// Configure pixgen
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logger::verbosity_to_filter().into());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), false) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    let result = match cli.command {
        Commands::Generate(cmd) => generate::handle_generate(cmd, &cli.global),
        Commands::Docs(cmd) => docs::handle_docs(cmd, &cli.global),
        Commands::List(cmd) => list::handle_list(cmd, &cli.global),
        Commands::Expand(cmd) => expand::handle_expand(cmd, &cli.global),
        Commands::Config { action } => config::handle_config(action, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
