//! Concept Language Server - Main entry point
//!
//! Provides LSP support for the concept DSL with:
//! - Keyword completion valid at the cursor
//! - Hover documentation for concept keywords
//! - Signature help while typing concept members
//! - Syntax error diagnostics

use concept_lsp::ConceptLanguageServer;
use tower_lsp::{LspService, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Setup logging to stderr (LSP uses stdout for protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concept_lsp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Concept Language Server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(ConceptLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
