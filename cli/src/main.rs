use clap::{Parser, Subcommand};

mod commands;
mod util;

use commands::approvals::ApprovalCommands;
use commands::interview::InterviewCommands;
use commands::prefs::PrefsCommands;
use commands::profile::ProfileCommands;

#[derive(Parser)]
#[command(
    name = "profil",
    version,
    about = "Profil CLI — interview, completeness, preference and approval operations"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "PROFIL_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API and collaborator health
    Health,
    /// Profile interview operations
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },
    /// Profile completeness and insight operations
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Preference-service operations
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Human-in-the-loop approval operations
    Approvals {
        #[command(subcommand)]
        command: ApprovalCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Interview { command } => commands::interview::run(&cli.api_url, command).await,
        Commands::Profile { command } => commands::profile::run(&cli.api_url, command).await,
        Commands::Prefs { command } => commands::prefs::run(&cli.api_url, command).await,
        Commands::Approvals { command } => commands::approvals::run(&cli.api_url, command).await,
    };

    std::process::exit(code);
}
