use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tokio::net::UdpSocket;

use rpc_middleware::config::TransportKind;
use rpc_middleware::Method;

#[derive(Parser)]
#[command(name = "rpc-cli")]
#[command(about = "Send one request to an rpc-middleware server", long_about = None)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Transport to use (tcp or udp)
    #[arg(short, long, default_value = "tcp")]
    transport: TransportKind,

    /// Print `{status, body}` as JSON
    #[arg(long)]
    json: bool,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Request method, e.g. GET
    method: Method,

    /// Request path, e.g. /soma
    path: String,

    /// Parameters as key=value
    #[arg(value_parser = parse_pair)]
    params: Vec<(String, String)>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let timeout = Duration::from_millis(cli.timeout_ms);

    let (status, body) = match cli.transport {
        TransportKind::Tcp => send_http(&cli, timeout).await?,
        TransportKind::Udp => (None, send_datagram(&cli, timeout).await?),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "status": status, "body": body }))?
        );
    } else {
        if let Some(status) = status.filter(|s| *s != 200) {
            eprintln!("Error: server returned status {}", status);
        }
        println!("{}", body);
    }
    Ok(())
}

async fn send_http(
    cli: &Cli,
    timeout: Duration,
) -> Result<(Option<u16>, String), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()?;
    let url = format!("http://{}:{}{}", cli.host, cli.port, cli.path);
    let method = reqwest::Method::from_bytes(cli.method.as_str().as_bytes())?;

    let request = client.request(method, url);
    let request = if cli.method.carries_body() {
        request.form(&cli.params)
    } else {
        request.query(&cli.params)
    };

    let res = request.send().await?;
    let status = res.status().as_u16();
    Ok((Some(status), res.text().await?))
}

async fn send_datagram(cli: &Cli, timeout: Duration) -> Result<String, Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect((cli.host.as_str(), cli.port)).await?;

    let mut line = format!("{} {}", cli.method, cli.path);
    if !cli.params.is_empty() {
        let query: Vec<String> = cli.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        line.push('?');
        line.push_str(&query.join("&"));
    }
    socket.send(line.as_bytes()).await?;

    let mut buffer = vec![0u8; 65_536];
    let len = tokio::time::timeout(timeout, socket.recv(&mut buffer))
        .await
        .map_err(|_| format!("no reply within {} ms", timeout.as_millis()))??;
    Ok(String::from_utf8_lossy(&buffer[..len]).into_owned())
}
