use clap::Parser;
use stickies::cli::commands::{Cli, Commands};
use stickies::cli::handlers;

fn main() {
    stickies::logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        // Init is handled before store discovery
        Some(Commands::Init(args)) => handlers::cmd_init(args, cli.project_dir.as_deref()),
        _ => handlers::dispatch(cli),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
