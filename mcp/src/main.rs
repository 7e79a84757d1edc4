use clap::Parser;

use profil_mcp_runtime::{McpCommands, run};

#[derive(Parser)]
#[command(
    name = "profil-mcp",
    version,
    about = "Profil MCP server — profile tool surface over stdio"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "PROFIL_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: McpCommands,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = run(&cli.api_url, cli.command).await;
    std::process::exit(code);
}
