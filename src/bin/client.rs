use clap::{Parser, Subcommand};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "cache-autoconfig")]
#[command(about = "client cli used by operators to check the cache pool of a running server", version, long_about = None
)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8080", help = "Base url of the server")]
    host: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// round trip to the cache through the server's pool
    Ping,
    /// show pool settings and counters
    Stats,
}

#[derive(Debug, Deserialize)]
struct PingResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    max_total: u32,
    max_idle: u32,
    max_wait_millis: Option<u64>,
    test_on_borrow: bool,
    authenticated: bool,
    closed: bool,
    connections: u32,
    idle_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();

    match args.command {
        Commands::Ping => {
            let res = Client::new()
                .get(format!("{}/{}", args.host, "cache/ping"))
                .send()
                .await?;
            match res.status() {
                StatusCode::OK => {
                    let res = res.json::<PingResponse>().await?;
                    println!("cache replied {}", res.reply);
                },
                StatusCode::SERVICE_UNAVAILABLE => {
                    println!("cache is unavailable: {}", res.text().await?);
                },
                StatusCode::GATEWAY_TIMEOUT => {
                    println!("timed out waiting for a cache connection");
                },
                unexpected => {
                    println!("got unexpected status code, {}", unexpected);
                },
            }
        },
        Commands::Stats => {
            let res = Client::new()
                .get(format!("{}/{}", args.host, "cache/stats"))
                .send()
                .await?;
            match res.status() {
                StatusCode::OK => {
                    let s = res.json::<StatsResponse>().await?;
                    let max_wait = s.max_wait_millis
                        .map(|ms| format!("{}ms", ms))
                        .unwrap_or("indefinite".to_string());
                    println!("max_total={} max_idle={} max_wait={} test_on_borrow={}", s.max_total, s.max_idle, max_wait, s.test_on_borrow);
                    println!("authenticated={} closed={}", s.authenticated, s.closed);
                    println!("connections={} idle={}", s.connections, s.idle_connections);
                },
                unexpected => {
                    println!("got unexpected status code, {}", unexpected);
                },
            }
        },
    };
    Ok(())
}
