mod backend;
mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use output::OutputFormat;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("purrcafe=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);

    // Identifier commands never touch storage.
    if let Commands::Id(command) = &cli.command {
        return commands::id::run(command, format);
    }

    let store = backend::open_store(&cli.backend_config)?;
    let result = match &cli.command {
        Commands::Id(_) => Ok(()),
        Commands::User(command) => commands::user::run(&store, command, format),
        Commands::Session(command) => commands::session::run(&store, command, format),
        Commands::File(command) => commands::file::run(&store, command, format),
    };

    // Persist whatever was committed, even if the command failed part-way.
    backend::persist(&store, &cli.backend_config)?;
    result
}
