//! Agora daemon: serves the voting page for one deployed proposal contract.

use agora_contract::{InterfaceDescriptor, RpcConnector, RpcTransport, RpcWallet, WalletProvider};
use agora_utils::{init_logging, LogFormat};
use agora_web::{ViewController, WebConfig, WebServer};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agora", about = "Participant voting page for a proposal contract")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

/// Settings that take precedence over the config file when given.
#[derive(clap::Args)]
struct Overrides {
    /// Address to serve the page on.
    #[arg(long, env = "AGORA_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// JSON-RPC endpoint of the wallet provider.
    #[arg(long, env = "AGORA_RPC_URL")]
    rpc_url: Option<String>,

    /// Address of the deployed proposal contract.
    #[arg(long, env = "AGORA_CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Interface descriptor (JSON ABI) of the contract.
    #[arg(long, env = "AGORA_ABI_PATH")]
    abi_path: Option<PathBuf>,

    /// Serve the page without a wallet provider.
    #[arg(long, env = "AGORA_NO_WALLET")]
    no_wallet: bool,

    /// Milliseconds between transaction receipt polls.
    #[arg(long, env = "AGORA_RECEIPT_POLL_MS")]
    receipt_poll_ms: Option<u64>,

    /// Milliseconds between wallet account polls.
    #[arg(long, env = "AGORA_ACCOUNT_POLL_MS")]
    account_poll_ms: Option<u64>,

    /// Timeout in seconds for one JSON-RPC request.
    #[arg(long, env = "AGORA_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGORA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the voting page.
    Serve,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Overrides {
    fn apply(self, base: WebConfig) -> WebConfig {
        WebConfig {
            listen_addr: self.listen_addr.unwrap_or(base.listen_addr),
            rpc_url: self.rpc_url.unwrap_or(base.rpc_url),
            contract_address: self.contract_address.or(base.contract_address),
            abi_path: self.abi_path.unwrap_or(base.abi_path),
            enable_wallet: base.enable_wallet && !self.no_wallet,
            receipt_poll_ms: self.receipt_poll_ms.unwrap_or(base.receipt_poll_ms),
            account_poll_ms: self.account_poll_ms.unwrap_or(base.account_poll_ms),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(base.request_timeout_secs),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // logging depends on the config, so file problems are reported after init
    let (file_config, file_error) = match cli.config.as_ref() {
        Some(path) => match WebConfig::from_toml_file(path) {
            Ok(cfg) => (Some(cfg), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };
    let config = cli.overrides.apply(file_config.unwrap_or_default());
    config.validate()?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format, &config.log_level);
    if let Some(path) = cli.config.as_ref() {
        match file_error {
            Some(e) => tracing::warn!("{e}, using CLI defaults"),
            None => tracing::info!("Loaded config from {}", path.display()),
        }
    }

    serve(config).await
}

async fn serve(config: WebConfig) -> anyhow::Result<()> {
    let descriptor = match InterfaceDescriptor::from_file(&config.abi_path) {
        Ok(descriptor) => {
            tracing::info!("Loaded interface descriptor from {}", config.abi_path.display());
            descriptor
        }
        Err(e) => {
            tracing::warn!(
                "Interface descriptor unavailable ({e}); contract calls will fail until it is provided"
            );
            InterfaceDescriptor::default()
        }
    };

    let contract_address = config.contract_address()?;
    match contract_address {
        Some(address) => tracing::info!("Using proposal contract {address}"),
        None => tracing::warn!("No contract address configured; connecting will fail"),
    }

    let transport = RpcTransport::new(&config.rpc_url, config.request_timeout())
        .context("building JSON-RPC client")?;
    let connector = Arc::new(RpcConnector::new(
        transport.clone(),
        contract_address,
        descriptor,
        config.receipt_poll(),
    ));

    let wallet: Option<Arc<dyn WalletProvider>> = if config.enable_wallet {
        let wallet = Arc::new(RpcWallet::new(transport));
        wallet.watch(config.account_poll());
        tracing::info!("Using wallet provider at {}", config.rpc_url);
        Some(wallet)
    } else {
        tracing::warn!("Wallet provider disabled; the page cannot connect");
        None
    };

    let controller = Arc::new(ViewController::new(wallet, connector));
    if let Err(e) = controller.restore().await {
        tracing::warn!("Could not restore previous session: {e}");
    }
    controller.watch_accounts();

    WebServer::new(config.listen_addr.clone(), controller)
        .start()
        .await
        .with_context(|| format!("serving on {}", config.listen_addr))
}
