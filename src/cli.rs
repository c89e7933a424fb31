use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::app_state::AppState;
use crate::config::{load_config, AppConfig};
use crate::model_store::ModelStore;
use crate::params::{Field, ParameterSet};
use crate::predictor::run_prediction;
use crate::web::build_router;

/// Membrane rejection & permeability prediction service
#[derive(Parser)]
#[command(name = "membrane_predict", version, about = "Membrane Performance Prediction")]
pub struct Cli {
    /// Path to a TOML config file (default: membrane.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the prediction form and JSON API
    Serve {
        /// Host/IP to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },

    /// Report whether each model loads, as JSON
    Status,

    /// Run a single prediction and print the report as JSON
    Predict(PredictArgs),
}

/// Parameter overrides; anything omitted keeps the form default.
#[derive(Args, Debug, Default)]
pub struct PredictArgs {
    /// Contact angle (°)
    #[arg(long, allow_negative_numbers = true)]
    pub ca: Option<f64>,
    /// Pore radius rp (nm)
    #[arg(long, allow_negative_numbers = true)]
    pub prr: Option<f64>,
    /// MWCO (Da)
    #[arg(long, allow_negative_numbers = true)]
    pub mwco: Option<f64>,
    /// RMS roughness (nm)
    #[arg(long, allow_negative_numbers = true)]
    pub rms: Option<f64>,
    /// Film thickness (nm), rejection only
    #[arg(long, allow_negative_numbers = true)]
    pub ft: Option<f64>,
    /// Pressure (bar)
    #[arg(long, allow_negative_numbers = true)]
    pub p: Option<f64>,
    /// Temperature (°C)
    #[arg(long, allow_negative_numbers = true)]
    pub temp: Option<f64>,
    /// Solute MW (g/mol)
    #[arg(long, allow_negative_numbers = true)]
    pub smw: Option<f64>,
    /// Concentration (mg/L), rejection only
    #[arg(long, allow_negative_numbers = true)]
    pub conc: Option<f64>,
}

impl PredictArgs {
    pub fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::default();
        let overrides = [
            (Field::ContactAngle, self.ca),
            (Field::PoreRadius, self.prr),
            (Field::Mwco, self.mwco),
            (Field::RmsRoughness, self.rms),
            (Field::FilmThickness, self.ft),
            (Field::Pressure, self.p),
            (Field::Temperature, self.temp),
            (Field::SoluteMw, self.smw),
            (Field::Concentration, self.conc),
        ];
        for (field, value) in overrides {
            if let Some(v) = value {
                params.set(field, v);
            }
        }
        params
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let level = config.log_level()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

/// Load models and stop if neither is usable.
fn load_store(config: &AppConfig) -> anyhow::Result<ModelStore> {
    let store = ModelStore::load(&config.models);
    if let Err(e) = store.ensure_servable() {
        error!(
            "Neither {} nor {} could be loaded; refusing to start",
            config.models.rejection.display(),
            config.models.permeability.display()
        );
        return Err(e.into());
    }
    Ok(store)
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = load_store(&config)?;
    let state = Arc::new(AppState::new(store, config.ui.clone()));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Serving membrane prediction on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Status => {
            let store = ModelStore::load(&config.models);
            println!("{}", serde_json::to_string_pretty(&store.status())?);
            if store.ensure_servable().is_err() {
                bail!("no model could be loaded");
            }
            Ok(())
        }
        Commands::Predict(args) => {
            let params = args.to_params();
            params.ensure_finite()?;
            let store = load_store(&config)?;
            let report = run_prediction(&store, &params);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
