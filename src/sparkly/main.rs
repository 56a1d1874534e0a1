use clap::Parser;
use sparkly::error::Result;

mod cli;
use cli::commands::{
    connect, handle_decode, handle_encode, handle_members, handle_rooms, handle_show,
    handle_teams, handle_webhooks,
};
use cli::logging::setup_tracing;
use cli::setup::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Decode { identifier } => handle_decode(&identifier),
        Commands::Encode {
            resource_type,
            uuid,
            region,
        } => handle_encode(&resource_type, &uuid, &region),
        Commands::Rooms { find, limit } => handle_rooms(&connect(config)?, find.as_deref(), limit),
        Commands::Teams => handle_teams(&connect(config)?),
        Commands::Webhooks => handle_webhooks(&connect(config)?),
        Commands::Show { identifier } => handle_show(&connect(config)?, &identifier),
        Commands::Members { room } => handle_members(&connect(config)?, &room),
    }
}
