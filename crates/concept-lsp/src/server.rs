//! LSP Server implementation for the concept DSL.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::analysis::DslContext;
use crate::config::ServerConfig;
use crate::handlers;
use crate::handlers::diagnostics::{to_lsp_diagnostic, DocumentDiagnostic};
use crate::publish::{DiagnosticsSink, PublishDiagnosticsRunner};
use crate::workspace::Workspace;

/// Forwards published diagnostics to the LSP client.
struct ClientDiagnosticsSink {
    client: Client,
}

#[async_trait]
impl DiagnosticsSink for ClientDiagnosticsSink {
    async fn publish(&self, uri: Url, diagnostics: Vec<DocumentDiagnostic>) -> anyhow::Result<()> {
        let diagnostics = diagnostics.iter().map(to_lsp_diagnostic).collect();
        self.client.publish_diagnostics(uri, diagnostics, None).await;
        Ok(())
    }
}

/// Concept Language Server state.
pub struct ConceptLanguageServer {
    /// LSP client for sending notifications
    client: Client,
    config: RwLock<ServerConfig>,
    workspace: Arc<Workspace>,
    /// Created in `initialized` once the publish interval is known
    publisher: Mutex<Option<Arc<PublishDiagnosticsRunner>>>,
}

impl ConceptLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config: RwLock::new(ServerConfig::default()),
            workspace: Arc::new(Workspace::new(Arc::new(DslContext::new()))),
            publisher: Mutex::new(None),
        }
    }

    /// Load the concept catalog on a blocking task. Queries made before it
    /// finishes see an uninitialized context and answer empty.
    fn spawn_catalog_initialization(&self, config: ServerConfig) {
        let context = Arc::clone(self.workspace.context());
        let client = self.client.clone();

        tokio::spawn(async move {
            let load_context = Arc::clone(&context);
            let loaded = tokio::task::spawn_blocking(move || {
                load_context.initialize_from_config(&config)
            })
            .await;

            let error = match loaded {
                Ok(Ok(())) => return,
                Ok(Err(e)) => format!("{e:#}"),
                Err(e) => format!("catalog loader task failed: {e}"),
            };

            tracing::error!("Failed to load concept catalog: {}", error);
            client
                .show_message(
                    MessageType::ERROR,
                    format!("Failed to load concept catalog, using the built-in one: {error}"),
                )
                .await;

            let fallback = ServerConfig {
                catalog_path: None,
                ..ServerConfig::default()
            };
            if let Err(e) = context.initialize_from_config(&fallback) {
                tracing::error!("Built-in concept catalog failed to load: {:#}", e);
            }
        });
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ConceptLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("Initializing Concept Language Server");

        let config = ServerConfig::from_env()
            .and_then(|config| config.merge_initialization_options(params.initialization_options.as_ref()));
        let config = match config {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Invalid configuration, using defaults: {:#}", e);
                ServerConfig::default()
            }
        };
        tracing::debug!("Server configuration: {:?}", config);

        *self.config.write().await = config.clone();
        self.spawn_catalog_initialization(config);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),

                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        " ".to_string(),
                        "{".to_string(),
                    ]),
                    ..Default::default()
                }),

                hover_provider: Some(HoverProviderCapability::Simple(true)),

                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        " ".to_string(),
                        ";".to_string(),
                        "{".to_string(),
                    ]),
                    retrigger_characters: Some(vec![" ".to_string()]),
                    ..Default::default()
                }),

                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "concept-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("Concept Language Server initialized");

        let interval = self.config.read().await.publish_interval();
        let mut publisher = self.publisher.lock().await;
        let runner = publisher.get_or_insert_with(|| {
            let sink = Arc::new(ClientDiagnosticsSink {
                client: self.client.clone(),
            });
            Arc::new(PublishDiagnosticsRunner::new(
                Arc::clone(&self.workspace),
                sink,
                interval,
            ))
        });
        runner.start();

        self.client
            .log_message(MessageType::INFO, "Concept Language Server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down Concept Language Server");
        let runner = self.publisher.lock().await.clone();
        if let Some(runner) = runner {
            runner.stop().await;
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        tracing::debug!("Document opened: {}", params.text_document.uri);
        self.workspace
            .update_document(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        tracing::debug!("Document changed: {}", params.text_document.uri);

        // Full sync: the last change carries the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.workspace
                .update_document(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        tracing::debug!("Document closed: {}", params.text_document.uri);
        self.workspace.close_document(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        tracing::debug!(
            "Completion request: uri={}, line={}, char={}",
            uri,
            position.line,
            position.character
        );

        let Some(document) = self.workspace.document(uri) else {
            tracing::warn!("No document found for completion request");
            return Ok(None);
        };

        let completions = handlers::completion::get_completions(&document, position);
        Ok(Some(CompletionResponse::Array(completions)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self
            .workspace
            .document(uri)
            .and_then(|document| handlers::hover::get_hover(&document, position)))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self
            .workspace
            .document(uri)
            .and_then(|document| handlers::signature::get_signature_help(&document, position)))
    }
}
