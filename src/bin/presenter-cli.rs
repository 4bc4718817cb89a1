use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "presenter-cli")]
#[command(about = "Query a running presenter", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show presenter version and mode
    Version,
    /// List every presented URL of a content ID
    Whereis { content_id: String },
    /// Search the content service
    Search {
        query: String,
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        per_page: Option<u64>,
    },
    /// Show the control repository SHA
    Control,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Version => client.get(format!("{base}/version")),
        Commands::Whereis { content_id } => client.get(format!("{base}/_api/whereis/{content_id}")),
        Commands::Search { query, page, per_page } => {
            let mut params = vec![("q", query)];
            if let Some(page) = page {
                params.push(("pageNumber", page.to_string()));
            }
            if let Some(per_page) = per_page {
                params.push(("perPage", per_page.to_string()));
            }
            client.get(format!("{base}/_api/search")).query(&params)
        }
        Commands::Control => client.get(format!("{base}/_api/control")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: presenter returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
