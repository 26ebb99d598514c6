#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for environmental anomaly analysis.
//!
//! Runs a single analysis against the configured Earth Observation
//! Service, lists the known-site catalog and indicator table, or starts
//! the API server.

mod aoi_file;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eo_anomaly::indicators::INDICATORS;
use eo_anomaly::sites::known_sites;
use eo_anomaly::{AnalysisRequest, AnalysisSettings, analyze};
use eo_anomaly_eos::{EosConfig, HttpEos};
use eo_anomaly_models::{DecisionMode, Satellite};
use eo_anomaly_server_models::ApiAnalysisResponse;

#[derive(Parser)]
#[command(name = "eo_anomaly", about = "Environmental anomaly analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an area of interest and print the JSON assessment
    Analyze {
        /// `GeoJSON` file holding a Polygon geometry, feature, or feature
        /// collection (first feature is used)
        #[arg(long)]
        aoi: PathBuf,
        /// First day of the target window (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Day after the last day of the target window (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Optical catalog (only Sentinel-2 is supported)
        #[arg(long)]
        satellite: Option<String>,
    },
    /// List the known high-risk sites
    Sites,
    /// Print the indicator definitions
    Indicators,
    /// Start the API server
    Serve {
        /// Bind address (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            aoi,
            start,
            end,
            satellite,
        } => {
            let aoi = aoi_file::load_aoi(&aoi)?;
            let request = AnalysisRequest::new(aoi, &start, &end, satellite.as_deref())?;
            let eos = HttpEos::new(EosConfig::from_env())?;
            let settings = AnalysisSettings::from_env();

            let assessment = analyze(&eos, &request, &settings).await?;
            let response = ApiAnalysisResponse::new("cli", assessment);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Sites => {
            println!("{:<40} {:>11} {:>10}", "NAME", "LONGITUDE", "LATITUDE");
            println!("{}", "-".repeat(63));
            for site in known_sites() {
                println!(
                    "{:<40} {:>11.4} {:>10.4}",
                    site.name, site.longitude, site.latitude
                );
            }
        }
        Commands::Indicators => {
            println!(
                "{:<8} {:<24} {:<8} {:<10} {:>6} {:>6}  FORMULA",
                "NAME", "CATALOG", "MODE", "ANOMALY", "GATE", "WEIGHT"
            );
            println!("{}", "-".repeat(110));
            for def in &INDICATORS {
                let mode = match def.mode {
                    DecisionMode::ZScore => "z-score",
                    DecisionMode::Direct => "direct",
                };
                println!(
                    "{:<8} {:<24} {:<8} {:<10} {:>5}% {:>6.2}  {}",
                    def.kind.to_string(),
                    def.collection(Satellite::default()).catalog_id(),
                    mode,
                    format!("{} {}", def.comparator.symbol(), def.threshold),
                    def.gate_min_pct,
                    eo_anomaly::fusion::weight(def.kind),
                    def.formula
                );
            }
        }
        Commands::Serve { bind, port } => {
            let (env_bind, env_port) = eo_anomaly_server::bind_from_env();
            let bind = bind.unwrap_or(env_bind);
            let port = port.unwrap_or(env_port);
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(eo_anomaly_server::run_server(bind, port))
            })
            .await??;
        }
    }

    Ok(())
}
