use std::sync::{mpsc, Arc};

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use scout_engine::{
    BlogPageGateway, ChannelEventSink, FileProgressStore, GatewaySettings, NaverBlogSearch,
    Pipeline, PipelineConfig, PipelineParts, SearchCredentials, ShutdownReport,
    SmartEditorExtractor, SqliteRecordStore,
};

use super::{events, logging, settings};

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize();

    let path = settings::config_path(std::env::args().skip(1));
    let config = settings::load_config(&path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build the async runtime")?;

    let (event_tx, event_rx) = mpsc::channel();
    let event_logger = events::spawn_event_logger(event_rx);
    let report = runtime.block_on(run_pipeline(config, ChannelEventSink::new(event_tx)))?;

    engine_info!(
        "shut down: {} batches / {} records persisted, {} records lost, {} dead-lettered",
        report.persister.batches,
        report.persister.records,
        report.persister.lost_records,
        report.persister.dead_lettered
    );
    if event_logger.join().is_err() {
        engine_warn!("event logger thread panicked");
    }
    Ok(())
}

async fn run_pipeline(
    config: PipelineConfig,
    sink: ChannelEventSink,
) -> anyhow::Result<ShutdownReport> {
    let credentials = SearchCredentials::from_env(&config.search)?;
    let search = NaverBlogSearch::new(config.search.clone(), credentials)?;
    let gateway = BlogPageGateway::new(
        GatewaySettings {
            fetch: config.fetch.fetch_settings(),
            content_wait: config.fetch.content_wait(),
            parse_workers: config.worker_count,
        },
        Arc::new(SmartEditorExtractor::new()?),
    )?;
    let store = SqliteRecordStore::open(&config.database_path)
        .with_context(|| format!("failed to open database {:?}", config.database_path))?;

    let pipeline = Pipeline::launch(
        config.queries.clone(),
        PipelineParts {
            search: Arc::new(search),
            gateway: Arc::new(gateway),
            progress: Arc::new(FileProgressStore::new(config.cursor_path.clone())),
            store: Arc::new(store),
            sink: Arc::new(sink),
        },
        &config,
    );

    let run_id = pipeline.supervisor().start()?;
    engine_info!(
        "discovery run {} started over {} queries; press Ctrl-C to stop",
        run_id,
        config.queries.len()
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                engine_warn!("cannot listen for Ctrl-C: {}", err);
            }
            engine_info!("interrupt received; stopping");
        }
        outcome = pipeline.supervisor().wait() => {
            if let Some(outcome) = outcome {
                engine_info!("discovery run {} {}", run_id, outcome);
            }
        }
    }

    Ok(pipeline.shutdown().await)
}
