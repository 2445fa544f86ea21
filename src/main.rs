use clap::Parser;

use speakersplit::cli::{Cli, Commands};
use speakersplit::commands;
use speakersplit::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("speakersplit=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Process {
            file,
            speakers,
            force,
        } => commands::process(&config, &file, speakers, force),
        Commands::List => commands::list(&config),
        Commands::Show { id } => commands::show(&config, &id),
        Commands::Export { id, out } => commands::export(&config, &id, &out),
        Commands::Delete { id } => commands::delete(&config, &id),
        Commands::Status => commands::status(&config),
        Commands::InitConfig => commands::init_config(cli.config.as_deref()),
    }
}
