//! concept-lsp: Language Server for the concept DSL
//!
//! Editor services (completion, hover, signature help, diagnostics) built on
//! cursor-relative reparsing:
//! - [`analysis`]: position index, token stream, parse runs and the
//!   per-document result cache
//! - [`handlers`]: the queries and their `lsp_types` conversions
//! - [`publish`]: the background diagnostics loop
//! - [`server`]: the `tower-lsp` shell

pub mod analysis;
pub mod config;
pub mod handlers;
pub mod publish;
pub mod server;
pub mod workspace;

pub use analysis::{DslContext, DslDocument, LineCol};
pub use config::{ConfigError, ServerConfig};
pub use publish::{DiagnosticsSink, PublishDiagnosticsRunner};
pub use server::ConceptLanguageServer;
pub use workspace::Workspace;
