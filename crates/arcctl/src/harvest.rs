use std::path::PathBuf;
use std::sync::Arc;

use api_client::ApiClient;
use cli_common::OrBail;
use csw::{CswClient, PropertyFilter, RecordsRequest};
use middleware_config::{ConfigWrapper, HarvestConfig};
use pipeline::{run_harvest, HarvestOptions, RunStats};
use tokio_util::sync::CancellationToken;
use url::Url;

const ENV_PREFIX: &str = "INSPIRE_TO_ARC";
const ACTIVITY_NAME: &str = "INSPIRE to ARC Harvest Run";
const INSTRUMENT_NAME: &str = "FAIRagro Middleware INSPIRE-to-ARC";

#[derive(Debug, clap::Args)]
pub struct HarvestArgs {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

pub async fn run(args: HarvestArgs, cancel: CancellationToken) {
    let config = match ConfigWrapper::from_yaml_file(&args.config, ENV_PREFIX)
        .and_then(|wrapper| HarvestConfig::from_wrapper(&wrapper))
    {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration from {:?}: {error}", args.config);
            std::process::exit(1);
        }
    };
    cli_common::init_logging(config.log_level.as_filter(), None);
    tracing::info!(csw_url = config.csw_url.as_str(), "starting INSPIRE harvest");

    let client = ApiClient::new(&config.api_client).or_bail("failed to build the API client");

    let endpoint = Url::parse(&config.csw_url).or_bail("invalid CSW endpoint URL");
    let csw_client = CswClient::new(endpoint).or_bail("failed to build the CSW client");

    let request = match &config.query {
        Some(query) => RecordsRequest::Constraints(vec![PropertyFilter::like(
            "csw:AnyText",
            format!("%{query}%"),
        )]),
        None => RecordsRequest::All,
    };

    match csw_client.count(&request).await {
        Ok(matches) => tracing::info!(matches, "catalogue reports matching records"),
        Err(error) => tracing::warn!(error = %error, "could not count matching records"),
    }

    let options = HarvestOptions {
        rdi: config.rdi.clone(),
        batch_size: config.batch_size,
        cancel,
    };

    let result = run_harvest(csw_client.harvest(request), Arc::new(client), options).await;

    match result {
        Ok(stats) => {
            emit_report(&stats);
            if stats.failed_datasets > 0 {
                tracing::warn!(
                    failed = stats.failed_datasets,
                    found = stats.found_datasets,
                    "harvest finished with failures"
                );
            } else {
                tracing::info!(found = stats.found_datasets, "harvest finished successfully");
            }
        }
        Err(failure) => {
            tracing::error!(error = %failure, "fatal error during harvest");
            emit_report(&failure.stats);
            std::process::exit(1);
        }
    }
}

fn emit_report(stats: &RunStats) {
    let report = stats.to_jsonld(ACTIVITY_NAME, INSTRUMENT_NAME, None);
    let rendered =
        serde_json::to_string_pretty(&report).or_bail("failed to render the run report");
    println!("{rendered}");
}
