//! whatsapp-gateway - REST gateway for a WhatsApp web client.

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use whatsapp_gateway::config::{DEFAULT_AUTH_DIR, DEFAULT_BRIDGE, DEFAULT_PORT};
use whatsapp_gateway::remote::DEFAULT_URL;
use whatsapp_gateway::{
    gateway, BridgeClient, Config, GatewayClient, SessionManager, SessionOptions,
};

/// REST gateway for a WhatsApp web client
#[derive(Parser, Debug)]
#[command(name = "whatsapp-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default)
    Serve,

    /// Query a running gateway
    Status {
        /// Gateway base URL
        #[arg(long, env = "WHATSAPP_SERVICE_URL", default_value = DEFAULT_URL)]
        url: String,
    },

    /// Send a message through a running gateway
    Send {
        /// Gateway base URL
        #[arg(long, env = "WHATSAPP_SERVICE_URL", default_value = DEFAULT_URL)]
        url: String,

        /// Recipient phone number
        #[arg(long)]
        phone: String,

        /// Message text
        #[arg(long)]
        message: String,
    },
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Listen address
    #[arg(long, env = "WHATSAPP_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Server port
    #[arg(short, long, env = "WHATSAPP_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory where the messaging client keeps its session
    #[arg(long, env = "WHATSAPP_AUTH_DIR", default_value = DEFAULT_AUTH_DIR)]
    auth_dir: PathBuf,

    /// Bridge executable hosting the messaging client
    #[arg(long, env = "WHATSAPP_BRIDGE", default_value = DEFAULT_BRIDGE)]
    bridge: String,

    /// Extra argument for the bridge (repeatable)
    #[arg(long = "bridge-arg", allow_hyphen_values = true)]
    bridge_args: Vec<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headful: bool,

    /// Do not print pairing codes as terminal QR codes
    #[arg(long)]
    no_terminal_qr: bool,
}

impl ServeArgs {
    fn into_config(self) -> Config {
        Config::new()
            .with_host(self.host)
            .with_port(self.port)
            .with_auth_dir(self.auth_dir)
            .with_bridge(self.bridge, self.bridge_args)
            .with_headless(!self.headful)
            .with_render_qr(!self.no_terminal_qr)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(args.serve.into_config()).await,
        Command::Status { url } => status(&url).await,
        Command::Send {
            url,
            phone,
            message,
        } => send(&url, &phone, &message).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("whatsapp-gateway v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(BridgeClient::new(config.bridge_options()));
    let session = SessionManager::new(
        client,
        SessionOptions {
            render_qr: config.render_qr,
        },
    )
    .await;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // The server comes up immediately; readiness arrives later through events.
    let starter = Arc::clone(&session);
    tokio::spawn(async move {
        if let Err(e) = starter.start().await {
            error!("failed to initialize messaging client: {}", e);
        }
    });

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down gracefully...");
    };
    gateway::run(listener, session, shutdown).await?;

    info!("Goodbye!");
    Ok(())
}

async fn status(url: &str) -> Result<()> {
    let status = GatewayClient::new(url).status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn send(url: &str, phone: &str, message: &str) -> Result<()> {
    let outcome = GatewayClient::new(url).send_message(phone, message).await;
    if !outcome.success {
        bail!(
            "send failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!(
        "Message sent to {}",
        outcome.to.as_deref().unwrap_or(phone)
    );
    Ok(())
}
