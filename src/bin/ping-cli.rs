use clap::Parser;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ping-cli")]
#[command(about = "Send one ping through the edge service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "hello")]
    message: String,

    /// Continue an existing trace instead of starting a new one
    #[arg(short, long)]
    traceparent: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut request = client
        .get(format!("{}/ping", cli.url.trim_end_matches('/')))
        .query(&[("message", cli.message.as_str())]);
    if let Some(traceparent) = &cli.traceparent {
        request = request.header("traceparent", traceparent);
    }

    let res = request.send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let trace_id = res
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    eprintln!("status: {}", status);
    eprintln!("trace id: {}", trace_id);

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
