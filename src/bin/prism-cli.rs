use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use prism_gateway::target::display::{display_domain, pretty_url};
use prism_gateway::target::{GatewayOrigin, Normalizer};

#[derive(Parser)]
#[command(name = "prism-cli")]
#[command(about = "Management CLI for the Prism gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browsing history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Bookmarks
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Print the normalized target and its proxy URL for an address or query
    Open {
        input: String,
        #[arg(long, default_value = "https://www.google.com/search?q=")]
        search_url: String,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List entries, newest first
    List,
    /// Delete all entries
    Clear,
}

#[derive(Subcommand)]
enum BookmarkAction {
    /// List bookmarks, newest first
    List,
    /// Add the URL, or remove it if already bookmarked
    Toggle {
        url: String,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Remove the bookmark for a URL
    Remove { url: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.command {
        Commands::History { action } => {
            let endpoint = format!("{base}/api/history");
            let req = match action {
                HistoryAction::List => client.get(endpoint),
                HistoryAction::Clear => client.delete(endpoint),
            };
            print_response(req.send().await?).await?;
        }
        Commands::Bookmarks { action } => {
            let endpoint = format!("{base}/api/bookmarks");
            let req = match action {
                BookmarkAction::List => client.get(endpoint),
                BookmarkAction::Toggle { url, title } => {
                    client.post(endpoint).json(&json!({ "url": url, "title": title }))
                }
                BookmarkAction::Remove { url } => client.delete(endpoint).query(&[("url", url)]),
            };
            print_response(req.send().await?).await?;
        }
        Commands::Open { input, search_url } => {
            let target = Normalizer::new(search_url).normalize(&input);
            if target.is_empty() {
                eprintln!("Error: nothing to open");
                std::process::exit(2);
            }
            let gateway = GatewayOrigin::parse(base)?;
            println!("target: {target}");
            println!("label:  {}", display_domain(&target));
            println!("short:  {}", pretty_url(&target));
            println!("proxy:  {}", gateway.proxy_url(&target));
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
