// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use vanity_domain_manager::{
    config::Config,
    constants::{
        APP_NAME, DEFAULT_CONFIG_PATH, MAX_DELIVERIES, ROUTER_BIND_ADDRESS, TOKIO_WORKER_THREADS,
    },
    environment::KubeEnvironment,
    queue::nats::QueueManager,
    reconcilers::{DeliveryController, EnvironmentReconciler, JobProcessor},
    router::build_router,
    status::StatusPublisher,
    verifiers::{SystemResolver, SystemTrustVerifier},
};

/// Verifies vanity domains and provisions their TLS secrets and ingress routes
#[derive(Debug, Parser)]
#[command(name = APP_NAME, version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Kubeconfig to use instead of in-cluster or default inference
    #[arg(long)]
    kubeconfig: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(APP_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_tracing() {
    // Respects RUST_LOG (default INFO) and RUST_LOG_FORMAT (json or text)
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
}

async fn kube_client(kubeconfig: Option<&Path>) -> Result<Client> {
    let Some(path) = kubeconfig else {
        return Ok(Client::try_default().await?);
    };

    debug!(path = %path.display(), "Loading kubeconfig");
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context("failed to build client config from kubeconfig")?;
    Ok(Client::try_from(config)?)
}

async fn async_main(cli: Cli) -> Result<()> {
    init_tracing();

    info!("Starting Vanity Domain Manager");

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    info!(
        environment = %config.system.environment,
        namespace = %config.cluster.namespace,
        "Configuration loaded"
    );

    debug!("Initializing Kubernetes client");
    let client = kube_client(cli.kubeconfig.as_deref()).await?;
    let environment = Arc::new(KubeEnvironment::new(
        client,
        config.cluster.namespace.clone(),
    ));

    let resolver = Arc::new(
        SystemResolver::from_system_conf().context("failed to read system resolver config")?,
    );
    let verifier = Arc::new(SystemTrustVerifier::from_system_roots()?);

    let queue = Arc::new(QueueManager::start(&config).await?);
    let status = StatusPublisher::new(queue.clone(), queue.subjects().clone());

    let processor = JobProcessor::new(
        resolver,
        verifier,
        EnvironmentReconciler::new(environment, config.cluster.clone()),
        status.clone(),
    );
    let controller = DeliveryController::new(processor, status, MAX_DELIVERIES);

    let address = format!("{ROUTER_BIND_ADDRESS}:{}", config.router.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind router to {address}"))?;
    info!(address = %address, "Router listening");
    let app = build_router(queue.clone());

    let worker = queue.start_domain_job_worker(controller, config.nats.max_concurrent_deliveries);

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // Neither the worker nor the router should return; either one exiting stops the process
    tokio::select! {
        result = worker => {
            error!("CRITICAL: domain job worker exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("domain job worker exited unexpectedly without error")
        }
        result = axum::serve(listener, app).into_future() => {
            error!("CRITICAL: router exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("router exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
            Ok(())
        }
        () = terminate => {
            info!("Received SIGTERM, shutting down");
            Ok(())
        }
    }
}
