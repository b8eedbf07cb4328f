use clap::Parser;
use std::net::IpAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabledb::interface::api::{start_server, ServerConfig};
use tabledb::VERSION;

/// Table CRUD サーバー
#[derive(Parser, Debug)]
#[command(name = "tabledb", version, about)]
struct Args {
    /// 待ち受けるアドレス
    #[arg(long, env = "TABLEDB_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// 待ち受けるポート
    #[arg(long, env = "TABLEDB_PORT", default_value_t = 8080)]
    port: u16,

    /// `token=subject`形式のベアラートークン（`!subject`で無効化）
    #[arg(long = "token", env = "TABLEDB_TOKENS", value_delimiter = ',')]
    tokens: Vec<String>,

    /// ログフィルター
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("TableDB version: {}", VERSION);

    let config = ServerConfig::builder()
        .host(args.host)
        .port(args.port)
        .tokens(args.tokens)
        .build();

    start_server(config).await?;
    Ok(())
}
