use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;
use clap::Parser;
use digest_transport::{default_client_builder, DigestTransport, ReqwestTransport};
use http_body_util::{BodyExt, Empty};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Fetch a URL, answering HTTP Digest challenges, and print the body
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The digest username
    #[arg(long)]
    username: String,

    /// The digest password
    #[arg(long)]
    password: String,

    /// The URL to request
    #[arg(long)]
    url: String,

    /// Log file for raw HTTP traffic
    #[arg(long)]
    wirelog: Option<PathBuf>,
}

fn init_logging(wirelog: Option<&Path>) -> io::Result<()> {
    match wirelog {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("trace"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.wirelog.as_deref())?;

    let client = default_client_builder()
        .cookie_store(true)
        .connection_verbose(args.wirelog.is_some())
        .build()?;
    let transport =
        DigestTransport::new(args.username, args.password, ReqwestTransport::new(client));

    let request = http::Request::get(args.url.as_str()).body(Empty::<Bytes>::new())?;
    let response = transport.execute(request).await?;

    if !response.status().is_success() {
        warn!(status = %response.status(), url = %args.url, "request was not successful");
    }

    let mut body = std::pin::pin!(response.into_body());
    let mut stdout = io::stdout().lock();
    while let Some(frame) = body.frame().await {
        if let Ok(chunk) = frame?.into_data() {
            stdout.write_all(&chunk)?;
        }
    }
    stdout.flush()?;

    Ok(())
}
