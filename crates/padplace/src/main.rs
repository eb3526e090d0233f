use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod extract;
mod footprints;
mod update;
mod wizard;

#[derive(Parser)]
#[command(name = "padplace")]
#[command(about = "Update KiCad footprint placements from DXF drawings", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract classified circle coordinates from a DXF drawing
    #[command(alias = "x")]
    Extract(extract::ExtractArgs),

    /// Run the whole extract-remap-rewrite pipeline non-interactively
    #[command(alias = "u")]
    Update(update::UpdateArgs),

    /// List footprint names present in a KiCad PCB file
    Footprints(footprints::FootprintsArgs),

    /// Guided interactive session
    #[command(alias = "w")]
    Wizard(wizard::WizardArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level keeps the remapper/rewriter warnings visible; RUST_LOG
    // still overrides.
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Extract(args) => extract::execute(args),
        Commands::Update(args) => update::execute(args),
        Commands::Footprints(args) => footprints::execute(args),
        Commands::Wizard(args) => wizard::execute(args),
    }
}
