// src/orchestrator/runner.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::errors::Result;
use crate::orchestrator::graph::Step;
use crate::pipeline::{Pipeline, SourceSelection};
use crate::watch::{spawn_watcher, Dispatcher, EVENT_CHANNEL_CAPACITY};

/// Execute `steps` in order; `Watch` runs until Ctrl-C.
pub async fn run_plan(pipeline: Arc<Pipeline>, steps: &[Step]) -> Result<()> {
    run_plan_until(pipeline, steps, ctrl_c()).await
}

/// Like [`run_plan`], with an explicit shutdown signal for `Watch`.
pub async fn run_plan_until<F>(pipeline: Arc<Pipeline>, steps: &[Step], shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut shutdown = Some(shutdown);

    for step in steps {
        info!(step = %step, "running step");
        match step {
            Step::Clean => pipeline.clean()?,
            Step::EnsureEntry => {
                let status = pipeline.ensure_entry()?;
                info!(status = ?status, entry = %pipeline.layout().entry.display(), "entry ready");
            }
            Step::Compile => {
                let report = pipeline.compile(&SourceSelection::All).await?;
                info!(
                    written = report.written.len(),
                    skipped = report.skipped.len(),
                    files_with_findings = report.findings.len(),
                    "compile finished"
                );
            }
            Step::Watch => {
                if let Some(signal) = shutdown.take() {
                    watch(Arc::clone(&pipeline), signal).await?;
                }
            }
        }
    }
    Ok(())
}

/// Watch the source root and dispatch events until `shutdown` resolves,
/// then drain in-flight jobs.
pub async fn watch<F>(pipeline: Arc<Pipeline>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let layout = pipeline.layout().clone();
    if !pipeline.fs().is_dir(&layout.src) {
        pipeline.fs().create_dir_all(&layout.src)?;
    }

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let handle = spawn_watcher(layout, Arc::clone(pipeline.fs()), tx)?;
    let mut dispatcher = Dispatcher::new(pipeline);

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested; draining watch jobs");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => dispatcher.dispatch(event).await,
                None => break,
            },
        }
    }

    drop(handle);
    dispatcher.drain().await;
    info!("watch stopped");
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves
/// and the process runs until terminated.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
