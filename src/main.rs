use std::process;

use clap::Parser;
use env_logger::Builder;
use log::{error, LevelFilter};

use port_for::cli::{App, Cli, Commands};
use port_for::error::Result;

/// Main entry point
fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger based on debug flag
    let mut builder = Builder::new();
    builder.filter_level(if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    builder.init();

    // Handle errors
    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        log::info!("No command specified. Use --help for usage information.");
        return Ok(());
    };

    let app = App::from_settings(cli.settings()?)?;

    // Execute the appropriate command
    match command {
        Commands::Bind(args) => args.execute(&app),
        Commands::Unbind(args) => args.execute(&app),
        Commands::List(args) => args.execute(&app),
        Commands::Select(args) => args.execute(&app),
        Commands::Pool(args) => args.execute(&app),
    }
}
