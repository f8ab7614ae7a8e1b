// Fetch one market's summary and order book and print them as CSV.
// Run with: cargo run --example market_data_demo -- --market BTC-LTC --side both

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use bittrex_md::{telemetry, BittrexClient, ClientConfig, OrderBookSide, Payload, Response};

#[derive(Debug, Parser)]
#[command(about = "Bittrex public market data demo")]
struct Args {
    #[arg(long, default_value = "BTC-LTC")]
    market: String,
    #[arg(long, default_value_t = OrderBookSide::Both)]
    side: OrderBookSide,
    /// Optional TOML config file; BITTREX_* env vars still override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Serve Prometheus metrics here (needs the `metrics-exporter` feature).
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

fn print_response(label: &str, response: &Response) -> anyhow::Result<()> {
    match &response.result {
        Payload::Table(table) => {
            println!("== {} ({} rows)", label, table.len());
            table.write_csv(io::stdout().lock())?;
        }
        Payload::Raw(_) => println!("== {} failed: {}", label, response.message),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    telemetry::init_tracing("info");

    let args = Args::parse();
    if let Some(addr) = args.metrics_addr {
        telemetry::init_metrics(addr)?;
    }
    let config = ClientConfig::load(args.config.as_deref())?;
    let client = BittrexClient::new(&config)?;

    if !client.ping().await {
        println!("{} is not reachable", config.base_url);
        return Ok(());
    }

    let summary = client.get_market_summary(&args.market).await?;
    print_response("market summary", &summary)?;

    let book = client.get_order_book(&args.market, args.side).await?;
    print_response("order book", &book)?;

    Ok(())
}
