use std::path::PathBuf;
use std::sync::Arc;

use api_client::ApiClient;
use cli_common::OrBail;
use middleware_config::{ConfigWrapper, SqlConfig};
use pipeline::{run_conversion, PipelineOptions, RunStats, ThreadPoolSerializer};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tokio_util::sync::CancellationToken;

const ENV_PREFIX: &str = "SQL_TO_ARC";
const ACTIVITY_NAME: &str = "SQL to ARC Conversion Run";
const INSTRUMENT_NAME: &str = "FAIRagro Middleware SQL-to-ARC";

#[derive(Debug, clap::Args)]
pub struct SqlToArcArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

pub async fn run(args: SqlToArcArgs, cancel: CancellationToken) {
    let config = match ConfigWrapper::from_yaml_file(&args.config, ENV_PREFIX)
        .and_then(|wrapper| SqlConfig::from_wrapper(&wrapper))
    {
        Ok(config) => config,
        Err(error) => {
            // Logging is configured from this very file, so the error can
            // only go to bare stderr.
            eprintln!("failed to load configuration from {:?}: {error}", args.config);
            std::process::exit(1);
        }
    };
    cli_common::init_logging(config.log_level.as_filter(), None);
    tracing::info!(config = ?args.config, "starting SQL-to-ARC conversion");
    if let Some(endpoint) = &config.otel.endpoint {
        tracing::debug!(endpoint = endpoint.as_str(), "OTLP span export is handled by the process wrapper");
    }

    let client = ApiClient::new(&config.api_client).or_bail("failed to build the API client");

    let mut conn = PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .username(&config.db_user)
        .password(config.db_password.expose())
        .database(&config.db_name)
        .connect()
        .await
        .or_bail("failed to connect to the upstream database");

    let options = PipelineOptions {
        rdi: config.rdi.clone(),
        max_concurrent_tasks: config.max_concurrent_tasks(),
        max_studies: config.max_studies,
        max_assays: config.max_assays,
        build_timeout: config.arc_generation_timeout(),
        cancel,
    };
    let serializer = Arc::new(ThreadPoolSerializer::new(config.max_concurrent_arc_builds));

    tracing::info!(
        cpu_workers = config.max_concurrent_arc_builds,
        max_tasks = options.max_concurrent_tasks,
        "starting streaming processing"
    );

    let result = run_conversion(
        sql_source::stream_datasets(&mut conn, config.db_batch_size),
        serializer,
        Arc::new(client),
        options,
    )
    .await;

    let _ = conn.close().await;

    let rdi_node = Some((config.rdi.as_str(), config.rdi_url.as_str()));
    match result {
        Ok(stats) => {
            emit_report(&stats, rdi_node);
            if stats.failed_datasets > 0 {
                tracing::warn!(
                    failed = stats.failed_datasets,
                    found = stats.found_datasets,
                    "conversion finished with failures"
                );
            } else {
                tracing::info!(found = stats.found_datasets, "conversion finished successfully");
            }
        }
        Err(failure) => {
            tracing::error!(error = %failure, "fatal error during conversion");
            emit_report(&failure.stats, rdi_node);
            std::process::exit(1);
        }
    }
}

fn emit_report(stats: &RunStats, rdi: Option<(&str, &str)>) {
    let report = stats.to_jsonld(ACTIVITY_NAME, INSTRUMENT_NAME, rdi);
    let rendered =
        serde_json::to_string_pretty(&report).or_bail("failed to render the run report");
    println!("{rendered}");
}
