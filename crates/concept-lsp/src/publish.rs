//! PublishDiagnosticsRunner: background loop that pushes diagnostics for
//! changed and closed documents.
//!
//! Every interval the runner collects the documents updated or closed since
//! the last successful pass, analyses each changed document as a whole and
//! hands the diagnostics to a [`DiagnosticsSink`]. Closed documents get an
//! empty set so the editor drops stale markers.
//!
//! ## Timestamps
//!
//! `last_publish` advances to the time the pass *started*, and only after all
//! dispatches completed. Edits made while a pass is running are picked up by
//! the next one; a failed pass is retried in full.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::Url;

use crate::handlers::diagnostics::{document_diagnostics, DocumentDiagnostic};
use crate::workspace::Workspace;

/// Receives the diagnostics of one document.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync + 'static {
    async fn publish(&self, uri: Url, diagnostics: Vec<DocumentDiagnostic>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// PublishDiagnosticsRunner
// ---------------------------------------------------------------------------

pub struct PublishDiagnosticsRunner {
    workspace: Arc<Workspace>,
    sink: Arc<dyn DiagnosticsSink>,
    interval: Duration,
    last_publish: Mutex<Option<Instant>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PublishDiagnosticsRunner {
    pub fn new(workspace: Arc<Workspace>, sink: Arc<dyn DiagnosticsSink>, interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            workspace,
            sink,
            interval,
            last_publish: Mutex::new(None),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Start of the last completed pass.
    pub fn last_publish(&self) -> Option<Instant> {
        *self.last_publish.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Spawn the loop. No-op once stopped or while already running.
    pub fn start(self: &Arc<Self>) {
        if *self.shutdown_tx.borrow() {
            tracing::debug!("PublishDiagnosticsRunner already stopped; not starting");
            return;
        }

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        tracing::info!("Starting PublishDiagnosticsRunner (interval {:?})", self.interval);
        let runner = Arc::clone(self);
        let shutdown_rx = self.shutdown_tx.subscribe();
        *task = Some(tokio::spawn(async move {
            runner.publish_loop(shutdown_rx).await;
        }));
    }

    /// Signal shutdown and wait for the loop to finish. Idempotent.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(task) = task else {
            return;
        };

        match task.await {
            Ok(()) => tracing::debug!("PublishDiagnosticsRunner stopped"),
            Err(e) if e.is_cancelled() => tracing::debug!("PublishDiagnosticsRunner cancelled"),
            Err(e) => tracing::warn!("PublishDiagnosticsRunner faulted while stopping: {}", e),
        }
    }

    async fn publish_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown_rx.changed() => break,
            }
            if *shutdown_rx.borrow() {
                break;
            }

            match AssertUnwindSafe(self.publish_pass()).catch_unwind().await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Error during document diagnostics: {:#}", e),
                Err(_) => tracing::warn!("Document diagnostics pass panicked"),
            }
        }
        tracing::debug!("PublishDiagnosticsRunner loop exited");
    }

    /// Publish diagnostics for everything changed or closed since the last
    /// pass. Returns the number of dispatches.
    pub async fn publish_pass(&self) -> Result<usize> {
        // Without a catalog every analysis is empty; hold changes back until
        // it is loaded so the first real diagnostics are not skipped.
        if !self.workspace.context().is_initialized() {
            tracing::debug!("Concept catalog not loaded yet; deferring diagnostics");
            return Ok(0);
        }

        let cycle_start = Instant::now();
        let since = self.last_publish();

        let changed = self.workspace.updated_since(since);
        let closed = self.workspace.closed_since(since);
        if changed.is_empty() && closed.is_empty() {
            return Ok(0);
        }

        let mut dispatches = Vec::with_capacity(changed.len() + closed.len());
        for uri in changed {
            let Some(document) = self.workspace.document(&uri) else {
                continue;
            };
            let diagnostics = document_diagnostics(&document.analysis());
            tracing::trace!("Publish {} diagnostics for '{}'", diagnostics.len(), uri);
            dispatches.push(self.sink.publish(uri, diagnostics));
        }
        for uri in closed {
            tracing::trace!("Clear diagnostics for closed '{}'", uri);
            dispatches.push(self.sink.publish(uri, Vec::new()));
        }

        let count = dispatches.len();
        join_all(dispatches)
            .await
            .into_iter()
            .collect::<Result<Vec<()>>>()?;

        *self.last_publish.lock().unwrap_or_else(PoisonError::into_inner) = Some(cycle_start);
        self.workspace.forget_closed_before(cycle_start);
        tracing::debug!(
            "Publish diagnostics complete for {} documents in {:.2} ms",
            count,
            cycle_start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DslContext;
    use concept_dsl::ConceptCatalog;

    type Published = Vec<(Url, Vec<DocumentDiagnostic>)>;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Published>,
    }

    #[async_trait]
    impl DiagnosticsSink for RecordingSink {
        async fn publish(&self, uri: Url, diagnostics: Vec<DocumentDiagnostic>) -> Result<()> {
            self.published.lock().unwrap().push((uri, diagnostics));
            Ok(())
        }
    }

    fn runner() -> (Arc<PublishDiagnosticsRunner>, Arc<RecordingSink>) {
        let workspace = Arc::new(Workspace::new(Arc::new(DslContext::new())));
        let sink = Arc::new(RecordingSink::default());
        let runner = Arc::new(PublishDiagnosticsRunner::new(
            workspace,
            sink.clone(),
            Duration::from_millis(10),
        ));
        (runner, sink)
    }

    #[test]
    fn test_stop_without_start() {
        let (runner, _) = runner();
        tokio_test::block_on(runner.stop());
        assert!(!runner.is_running());
        assert!(runner.last_publish().is_none());
    }

    #[test]
    fn test_pass_waits_for_catalog() {
        let (runner, sink) = runner();
        let uri = Url::parse("file:///a.concepts").unwrap();
        runner
            .workspace
            .update_document(uri.clone(), "Entity Book { Short Name; }".into());

        assert_eq!(tokio_test::block_on(runner.publish_pass()).unwrap(), 0);
        assert!(runner.last_publish().is_none());

        runner
            .workspace
            .context()
            .initialize(ConceptCatalog::builtin().unwrap());
        assert_eq!(tokio_test::block_on(runner.publish_pass()).unwrap(), 1);

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, uri);
        assert_eq!(published[0].1.len(), 1);
    }

    #[test]
    fn test_published_close_marks_are_forgotten() {
        let (runner, _) = runner();
        runner.workspace.context().initialize(ConceptCatalog::builtin().unwrap());
        let uri = Url::parse("file:///a.concepts").unwrap();
        runner.workspace.update_document(uri.clone(), "Entity Book;".into());
        runner.workspace.close_document(&uri);
        assert_eq!(runner.workspace.closed_since(None), vec![uri]);

        assert_eq!(tokio_test::block_on(runner.publish_pass()).unwrap(), 1);
        assert!(runner.workspace.closed_since(None).is_empty());
    }
}
