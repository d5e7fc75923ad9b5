use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "nse-cli")]
#[command(about = "Query a running nse-proxy and pretty-print the JSON", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-open market snapshot (NIFTY, BANKNIFTY, SME, FO, OTHERS, ALL)
    PreMarket { key: String },
    /// Live index snapshot, e.g. "NIFTY 50"
    LiveMarket {
        key: String,
        /// Print only the symbols
        #[arg(long)]
        symbols: bool,
    },
    /// Holiday calendar (trading, clearing)
    Holiday { key: String },
    /// Option chain for an equity or, with --index, an index
    OptionChain {
        symbol: String,
        #[arg(long)]
        index: bool,
    },
    /// Equity history of the nearest trading day at or before DATE (DD-MM-YYYY)
    History {
        symbol: String,
        date: String,
        #[arg(long, default_value = "EQ")]
        series: String,
    },
    /// Supported key lists
    Keys,
}

impl Commands {
    fn path(&self) -> String {
        match self {
            Commands::PreMarket { key } => format!("/nse/pre_market_data/{}", segment(key)),
            Commands::LiveMarket { key, symbols } => {
                format!("/nse/live_market_data/{}/{}", segment(key), symbols)
            }
            Commands::Holiday { key } => format!("/nse/holiday_data/{}", segment(key)),
            Commands::OptionChain { symbol, index } => {
                format!("/nse/option_chain_data/{}/{}", segment(symbol), index)
            }
            Commands::History { symbol, date, series } => format!(
                "/get_equity_data/{}/{}/{}",
                segment(symbol),
                segment(series),
                segment(date)
            ),
            Commands::Keys => "/nse/keys".to_string(),
        }
    }
}

/// Percent-encode one path segment ("NIFTY 50" -> "NIFTY%2050").
fn segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
