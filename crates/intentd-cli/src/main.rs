mod display;
mod logging;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use intentd_ai::{LoadSummary, ModelRegistry, Predictor};
use intentd_core::KNOWN_MODELS;
use intentd_http::{AppState, IntentClient};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "intentd", version, about = "Serve and query intent classification models")]
struct Cli {
    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load models and serve the HTTP API.
    Serve {
        #[command(flatten)]
        models: ModelArgs,

        /// Address to listen on.
        #[arg(long, env = "INTENTD_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Answer /health with 503 while no model is loaded.
        #[arg(
            long,
            env = "INTENTD_STRICT_HEALTH",
            value_parser = BoolishValueParser::new()
        )]
        strict_health: bool,
    },
    /// Classify text with locally loaded models.
    Predict {
        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        target: PredictArgs,
    },
    /// Load models and describe what loaded.
    Models {
        #[command(flatten)]
        models: ModelArgs,
    },
    /// Talk to a running server.
    Remote {
        #[arg(long, env = "INTENTD_URL", default_value = "http://localhost:8000")]
        url: String,

        #[command(subcommand)]
        command: RemoteCommand,
    },
}

#[derive(Subcommand)]
enum RemoteCommand {
    Health,
    Models,
    Predict {
        #[command(flatten)]
        target: PredictArgs,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Directory holding `<id>_model.json` and vectorizer artifacts.
    #[arg(long, env = "INTENTD_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    /// Model identifiers to load.
    #[arg(
        long = "model-ids",
        env = "INTENTD_MODELS",
        value_delimiter = ',',
        default_values_t = default_model_ids()
    )]
    ids: Vec<String>,
}

impl ModelArgs {
    fn load(&self) -> (ModelRegistry, LoadSummary) {
        ModelRegistry::load_dir(&self.models_dir, self.ids.as_slice())
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Model identifier.
    #[arg(short, long, default_value = "naive_bayes", conflicts_with = "all")]
    model: String,

    /// Run every available model.
    #[arg(long)]
    all: bool,

    text: String,
}

fn default_model_ids() -> Vec<String> {
    KNOWN_MODELS.iter().map(|m| m.id.to_string()).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Serve {
            models,
            bind,
            strict_health,
        } => serve(models, bind, strict_health).await,
        Command::Predict { models, target } => predict_local(&models, &target),
        Command::Models { models } => {
            let (registry, summary) = models.load();
            display::print_registry(&registry);
            display::print_load_failures(&summary);
            Ok(())
        }
        Command::Remote { url, command } => remote(IntentClient::new(url), command).await,
    }
}

async fn serve(models: ModelArgs, bind: SocketAddr, strict_health: bool) -> anyhow::Result<()> {
    info!("intentd v{}", env!("CARGO_PKG_VERSION"));
    let (registry, summary) = models.load();
    if registry.is_empty() {
        warn!(
            dir = %models.models_dir.display(),
            failed = summary.failed.len(),
            "no models loaded, serving in degraded state"
        );
    }

    let state = AppState::new(Predictor::new(Arc::new(registry))).strict_health(strict_health);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;

    intentd_http::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await
    .context("serving HTTP")
}

fn predict_local(models: &ModelArgs, target: &PredictArgs) -> anyhow::Result<()> {
    let (registry, summary) = models.load();
    display::print_load_failures(&summary);
    let predictor = Predictor::new(Arc::new(registry));

    if target.all {
        let resp = predictor.predict_all(&target.text)?;
        display::print_predict_all(&resp);
    } else {
        let result = predictor.predict(&target.text, &target.model)?;
        display::print_prediction(&result);
    }
    Ok(())
}

async fn remote(client: IntentClient, command: RemoteCommand) -> anyhow::Result<()> {
    let base = client.base_url().to_string();
    match command {
        RemoteCommand::Health => {
            let health = client
                .health()
                .await
                .with_context(|| format!("checking health at {base}"))?;
            display::print_health(&health);
        }
        RemoteCommand::Models => {
            let models = client
                .models()
                .await
                .with_context(|| format!("listing models at {base}"))?;
            display::print_models(&models);
        }
        RemoteCommand::Predict { target } if target.all => {
            let resp = client
                .predict_all(&target.text)
                .await
                .with_context(|| format!("predicting at {base}"))?;
            display::print_predict_all(&resp);
        }
        RemoteCommand::Predict { target } => {
            let result = client
                .predict(&target.text, &target.model)
                .await
                .with_context(|| format!("predicting at {base}"))?;
            display::print_prediction(&result);
        }
    }
    Ok(())
}
