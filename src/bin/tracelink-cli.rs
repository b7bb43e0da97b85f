use clap::{Parser, Subcommand};
use serde_json::Value;

use tracelink::trace::{propagation, SpanId, TraceContext, TraceId, TRACEPARENT_HEADER};

#[derive(Parser)]
#[command(name = "tracelink-cli")]
#[command(about = "Query the tracelink catalog and user services", long_about = None)]
struct Cli {
    /// User service base URL
    #[arg(long, default_value = "http://localhost:8001")]
    user_url: String,

    /// Catalog service base URL
    #[arg(long, default_value = "http://localhost:8002")]
    catalog_url: String,

    /// Send this traceparent instead of letting the service start a trace.
    /// Use `new` to mint a fresh one.
    #[arg(short, long)]
    trace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users
    Users,
    /// Show one user
    User { id: u64 },
    /// List products, optionally in one category
    Products {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Category counts
    Categories,
    /// Recommendations for a user
    Recommend {
        id: u64,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Request metrics of both services
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let traceparent = match cli.trace.as_deref() {
        Some("new") => Some(fresh_traceparent()?),
        Some(value) => Some(value.to_string()),
        None => None,
    };

    let get = |url: String| {
        let mut request = client.get(url);
        if let Some(value) = &traceparent {
            request = request.header(TRACEPARENT_HEADER, value);
        }
        request
    };

    match cli.command {
        Commands::Users => print_response(get(format!("{}/users", cli.user_url)).send().await?).await?,
        Commands::User { id } => {
            print_response(get(format!("{}/users/{}", cli.user_url, id)).send().await?).await?
        }
        Commands::Products { category, limit } => {
            let mut request = get(format!("{}/products", cli.catalog_url));
            if let Some(category) = category {
                request = request.query(&[("category", category)]);
            }
            if let Some(limit) = limit {
                request = request.query(&[("limit", limit)]);
            }
            print_response(request.send().await?).await?
        }
        Commands::Categories => {
            print_response(get(format!("{}/categories", cli.catalog_url)).send().await?).await?
        }
        Commands::Recommend { id, limit } => {
            let mut request = get(format!("{}/users/{}/recommendations", cli.user_url, id));
            if let Some(limit) = limit {
                request = request.query(&[("limit", limit)]);
            }
            print_response(request.send().await?).await?
        }
        Commands::Metrics => {
            for base in [&cli.user_url, &cli.catalog_url] {
                println!("# {}", base);
                print_response(get(format!("{}/metrics", base)).send().await?).await?;
            }
        }
    }

    Ok(())
}

fn fresh_traceparent() -> Result<String, Box<dyn std::error::Error>> {
    let ctx = TraceContext::remote(TraceId::random(), SpanId::random(), true);
    let headers = propagation::inject(&ctx);
    let value = headers
        .get(TRACEPARENT_HEADER)
        .ok_or("traceparent not injected")?
        .to_str()?
        .to_string();
    eprintln!("traceparent: {}", value);
    Ok(value)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let trace_id = res
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    eprintln!("status: {}  trace: {}", status, trace_id);

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
