use anyhow::Context;
use prompthub_api::PromptHub;
use prompthub_core::config::Settings;
use prompthub_core::runtime::source_from_settings;
use prompthub_core::{HubEngineBuilder, HubHandle};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let source = source_from_settings(&settings, None);
    let engine = Arc::new(HubEngineBuilder::from_settings(&settings, source).build());

    let report = engine
        .init()
        .await
        .context("failed to build the initial prompt index")?;
    info!(
        "Indexed {} prompts ({} rejected) in {:?}",
        report.document_count,
        report.rejected(),
        report.elapsed
    );

    engine.start_background()?;

    let token = engine.cancel_token();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        ctrl_c_token.cancel();
    });

    let hub: Arc<dyn PromptHub> = Arc::new(HubHandle::new(Arc::clone(&engine)));
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    prompthub_server::serve(hub, addr, &settings.allowed_origins, token)
        .await
        .with_context(|| format!("HTTP server on {addr} failed"))?;

    engine.shutdown();
    info!("Server stopped");
    Ok(())
}
