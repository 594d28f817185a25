use bili_client::{BiliApiClient, Crawler, InterruptFlag};
use insight_core::{AppConfig, CoreError, ErrorExt, ErrorReporter};
use insight_pipeline::{Pipeline, PipelineOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "danmaku_insight=info,bili_client=info,text_analysis=info,insight_pipeline=info,insight_core=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting danmaku-insight");

    if let Err(e) = run().await {
        ErrorReporter::new().report_error(&e);
        eprintln!("Error: {}", e.user_friendly_message());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CoreError> {
    let config = AppConfig::load()?;

    let interrupt = InterruptFlag::new();
    spawn_interrupt_listener(interrupt.clone());

    let client = BiliApiClient::new(&config.crawl)?;
    let crawler = Crawler::new(client, &config.crawl).with_interrupt(interrupt);
    let mut pipeline = Pipeline::from_config(crawler, &config)?;

    match pipeline.run().await? {
        PipelineOutcome::Completed(stats) => {
            info!(
                "Done: {} of {} comments kept, top {} ranked",
                stats.filtered_count,
                stats.original_count,
                stats.top_entries.len()
            );
        }
        PipelineOutcome::NoData => {}
        PipelineOutcome::Interrupted { collected } => {
            println!("\nInterrupted by user ({} comments collected)", collected);
        }
    }

    Ok(())
}

/// First Ctrl-C stops the crawl at the next request; a second one exits.
/// Before the crawl starts (e.g. at the cache prompt) the first one exits.
fn spawn_interrupt_listener(interrupt: InterruptFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        interrupt.trigger();
        if !interrupt.is_crawling() {
            println!("\nInterrupted by user");
            std::process::exit(0);
        }
        warn!("Interrupt received, stopping after the current request");

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt, exiting");
            std::process::exit(0);
        }
    });
}
