use std::sync::Arc;

use anyhow::Context;
use common::logger::init_logger;
use oracle::{
    chain::{AlloyChainClient, ChainClient, OperatorSigner, Signer},
    config::{AppConfig, TargetPriceConfig},
    error::AppError,
    execution::UpdateSubmitter,
    metrics::{Telemetry, server::serve_metrics},
    price::{FixedPriceSource, PriceAggregator, PriceSource, TickerClient},
    scheduler::UpdateCycle,
};
use tokio::sync::watch;

/// Builds the reference and target price sources from configuration.
fn setup_prices(cfg: &AppConfig) -> anyhow::Result<PriceAggregator> {
    let ticker = Arc::new(
        TickerClient::new(cfg.price_api_url.clone()).context("failed to build ticker client")?,
    );

    let target: Arc<dyn PriceSource> = match &cfg.target_price {
        TargetPriceConfig::Ticker { .. } => ticker.clone(),
        TargetPriceConfig::Fixed { usd_price, .. } => {
            tracing::warn!(usd_price, "using fixed fee token price");
            Arc::new(FixedPriceSource::new(*usd_price))
        }
    };

    Ok(PriceAggregator::new(
        ticker,
        cfg.reference_symbol.clone(),
        target,
        cfg.target_price.symbol().to_string(),
    ))
}

/// Connects to L1 and checks the node answers. Any failure here is fatal.
async fn connect_chain(cfg: &AppConfig) -> Result<(Arc<AlloyChainClient>, u64), AppError> {
    let client = AlloyChainClient::connect(
        &cfg.rpc_url,
        cfg.system_config_address,
        cfg.confirmation_timeout,
    )
    .map_err(|e| AppError::Connectivity(e.to_string()))?;

    let chain_id = client
        .chain_id()
        .await
        .map_err(|e| AppError::Connectivity(format!("failed to get chain id: {e}")))?;

    Ok((Arc::new(client), chain_id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().map_err(AppError::from)?;

    init_logger("oracle", cfg.json_logs);
    tracing::info!("scalar oracle starting");

    let signer = Arc::new(
        OperatorSigner::from_hex(cfg.operator_key.expose(), cfg.chain_id)
            .map_err(|e| AppError::Signing(e.to_string()))
            .context("failed to load operator key")?,
    );

    let (chain, chain_id) = connect_chain(&cfg).await?;

    // Fail fast on a chain mismatch instead of failing every cycle at signing.
    signer
        .authorize(chain_id)
        .map_err(|e| AppError::Signing(e.to_string()))?;

    tracing::info!(
        chain_id,
        system_config = %cfg.system_config_address,
        operator = %signer.address(),
        "connected to L1"
    );
    tracing::info!(
        update_threshold_percent = cfg.scalar.update_threshold_percent,
        da_factor = cfg.scalar.effective_da_factor(),
        safety_margin = cfg.scalar.safety_margin,
        min_scalar = %cfg.scalar.min_scalar,
        max_scalar = %cfg.scalar.max_scalar,
        check_interval_s = cfg.check_interval.as_secs(),
        "configuration loaded"
    );

    let telemetry = Telemetry::new();

    if let Some(addr) = cfg.metrics_addr {
        let reader = telemetry.reader();
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(addr, reader).await {
                tracing::error!(error = ?e, "metrics server stopped");
            }
        });
    }

    let submitter = UpdateSubmitter::new(chain, signer, chain_id)
        .with_wait_for_confirmation(cfg.wait_for_confirmation);

    let cycle = UpdateCycle::new(
        setup_prices(&cfg)?,
        submitter,
        cfg.scalar.clone(),
        telemetry,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    cycle.run(cfg.check_interval, shutdown_rx).await;

    Ok(())
}
