// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use alby::constants::{
    ERROR_REQUEUE_DURATION_SECS, KIND_HOSTNAME_REQUEST, METRICS_SERVER_PATH, TOKIO_WORKER_THREADS,
};
use alby::crd::HostnameRequest;
use alby::{config::Config, config::LeaderElectionConfig, metrics};
use anyhow::Result;
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::LeaseManagerBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use alby::aws::acm::AcmCertificateAuthority;
use alby::aws::route53::Route53DnsRegistry;
use alby::gateway::GatewayPool;
use alby::reconcilers::{reconcile_hostname_request, Context};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("alby-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Alby gateway hostname orchestrator");
}

/// Initialize the Kubernetes client and the AWS-backed reconciler context.
async fn initialize_context(config: Config) -> Result<Context> {
    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    debug!("Loading AWS SDK configuration");
    let sdk_config = aws_config::load_from_env().await;
    info!(
        region = sdk_config.region().map(|r| r.as_ref()).unwrap_or("unset"),
        "AWS clients initialized"
    );

    let pool = GatewayPool::new(
        client.clone(),
        config.gateway_namespace.clone(),
        config.gateway_class.clone(),
        config.http_port,
        config.https_port,
    );

    Ok(Context {
        client,
        certificate_authority: Arc::new(AcmCertificateAuthority::new(&sdk_config)),
        dns_registry: Arc::new(Route53DnsRegistry::new(&sdk_config)),
        pool,
        config,
    })
}

/// Start the metrics and health HTTP server.
///
/// Serves `/metrics`, `/healthz`, and `/readyz` on the configured address.
fn start_metrics_server(bind_address: String) -> tokio::task::JoinHandle<()> {
    info!(%bind_address, path = METRICS_SERVER_PATH, "Starting metrics HTTP server");

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        async fn health_handler() -> &'static str {
            "ok"
        }

        let app = Router::new()
            .route(METRICS_SERVER_PATH, get(metrics_handler))
            .route("/healthz", get(health_handler))
            .route("/readyz", get(health_handler));

        let listener = match tokio::net::TcpListener::bind(&bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_address}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_address}{METRICS_SERVER_PATH}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Create a semantic watcher configuration.
///
/// Only triggers on semantic changes (spec modifications), ignoring
/// status-only updates. This prevents reconciliation loops when the
/// controller persists status between pipeline steps; periodic requeues
/// cover drift detection in the meantime.
#[inline]
fn semantic_watcher_config() -> watcher::Config {
    watcher::Config::default().any_semantic()
}

/// Reconcile wrapper for `HostnameRequest`
async fn reconcile_wrapper(
    request: Arc<HostnameRequest>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = std::time::Instant::now();

    debug!(
        request = %request.name_any(),
        "Reconcile wrapper called for HostnameRequest"
    );

    let result = reconcile_hostname_request(&ctx, (*request).clone()).await;
    let duration = start.elapsed();

    match result {
        Ok(action) => {
            metrics::record_reconciliation_success(KIND_HOSTNAME_REQUEST, duration);
            Ok(action)
        }
        Err(e) => {
            error!("Failed to reconcile HostnameRequest: {:?}", e);
            metrics::record_reconciliation_error(KIND_HOSTNAME_REQUEST, duration);
            Err(e.into())
        }
    }
}

/// Error policy: the work queue applies exponential backoff on repeated
/// failures; this sets the base delay.
fn error_policy(request: Arc<HostnameRequest>, error: &ReconcileError, _ctx: Arc<Context>) -> Action {
    warn!(
        request = %request.name_any(),
        error = %error,
        "Reconciliation errored, requeueing"
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Run the `HostnameRequest` controller until the stream ends.
async fn run_hostnamerequest_controller(ctx: Context) -> Result<()> {
    info!("Starting HostnameRequest controller");

    let api = Api::<HostnameRequest>::all(ctx.client.clone());

    Controller::new(api, semantic_watcher_config())
        .run(reconcile_wrapper, error_policy, Arc::new(ctx))
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the controller with signal handling; returns on SIGINT/SIGTERM.
async fn run_with_signals(ctx: Context) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }

        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result
        }

        result = run_hostnamerequest_controller(ctx) => {
            error!("CRITICAL: HostnameRequest controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HostnameRequest controller exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Monitor leadership status - returns when leadership is lost
async fn monitor_leadership(
    mut leader_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), anyhow::Error> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            return Ok(());
        }
    }
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let config = Config::from_env();
    info!(
        gateway_namespace = %config.gateway_namespace,
        gateway_class = %config.gateway_class,
        http_port = config.http_port,
        https_port = config.https_port,
        allowed_domains = config.allowed_domains.len(),
        "Controller configuration loaded"
    );

    let ctx = initialize_context(config.clone()).await?;
    let client = ctx.client.clone();

    let _metrics_handle = start_metrics_server(config.metrics_bind_address.clone());

    let leader_config = LeaderElectionConfig::from_env();

    if leader_config.enabled {
        info!(
            lease_name = %leader_config.lease_name,
            lease_namespace = %leader_config.lease_namespace,
            identity = %leader_config.identity,
            lease_duration_secs = leader_config.lease_duration,
            "Leader election enabled"
        );
        info!("Starting leader election, waiting to acquire leadership...");

        let lease_manager = LeaseManagerBuilder::new(client, &leader_config.lease_name)
            .with_namespace(&leader_config.lease_namespace)
            .with_identity(&leader_config.identity)
            .with_duration(leader_config.lease_duration)
            .with_grace(leader_config.retry_period)
            .build()
            .await?;

        let (leader_rx, _lease_handle) = lease_manager.watch().await;

        // Wait until we become leader
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }

        info!("Leadership acquired, starting controller");

        tokio::select! {
            result = run_with_signals(ctx) => result?,
            result = monitor_leadership(leader_rx) => {
                result?;
                // All writes rely on API-server optimistic concurrency, so the
                // safe response to losing the lease is to stop writing at all.
                warn!("Leadership lost, shutting down for a clean restart");
            }
        }
    } else {
        warn!("Leader election DISABLED - running without high availability");
        run_with_signals(ctx).await?;
    }

    Ok(())
}
