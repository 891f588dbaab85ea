use anyhow::{Context, Result};
use clap::Parser;
use signstream::batch::BatchTranslationService;
use signstream::classify::BiLstmClassifier;
use signstream::config::Config;
use signstream::gateway::Gateway;
use signstream::landmark::{HandNet, LandmarkExtractor};
use signstream::streaming::StreamingSessionManager;
use signstream::video::FfmpegClipDecoder;

use candle_core::Device;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "signstream", version = signstream::version_string())]
#[command(about = "Real-time sign language recognition service")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding the configuration
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    info!(
        "signstream {} starting ({} backend)",
        signstream::version_string(),
        signstream::defaults::compute_backend()
    );

    let device = inference_device()?;
    let detector = HandNet::load(&config.model.hand_weights, &device)
        .context("loading hand landmark model")?;
    info!("hand detector: {}", detector.model_name());
    let classifier = Arc::new(
        BiLstmClassifier::load(&config.model, &config.stream, &device)
            .context("loading sequence classifiers")?,
    );

    let extractor = LandmarkExtractor::new(Arc::new(detector));
    let streaming = Arc::new(StreamingSessionManager::new(
        extractor.clone(),
        classifier.clone(),
        config.stream.clone(),
    ));
    let batch = Arc::new(BatchTranslationService::new(
        extractor,
        classifier,
        Arc::new(FfmpegClipDecoder::new()),
        config.stream.clone(),
    ));

    let gateway = Arc::new(Gateway::new(streaming, batch));

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let shutdown_gateway = gateway.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received ctrl-c"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
        shutdown_gateway.shutdown();
    });

    gateway
        .run(&config.server.host, config.server.port)
        .await
        .context("gateway failed")?;
    info!("signstream stopped");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("signstream={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/signstream/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)?
    };
    Ok(config.with_env_overrides())
}

fn inference_device() -> Result<Device> {
    #[cfg(feature = "cuda")]
    {
        Device::new_cuda(0).context("initializing CUDA device")
    }
    #[cfg(not(feature = "cuda"))]
    {
        Ok(Device::Cpu)
    }
}
