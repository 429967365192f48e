//! # FlowStudio Architecture
//!
//! FlowStudio is the **host side** of a Markdown and PlantUML editing studio. The editor UI
//! (a webview, or the bundled CLI) never touches disk or network itself: it asks the host,
//! and the host answers with typed results.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Front ends                                                 │
//! │  - main.rs / args.rs: the CLI, the only terminal I/O        │
//! │  - host.rs: async request/response boundary for the editor  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Applies config: render server, toggles, output dirs      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic, returns CmdResult                        │
//! └─────────────────────────────────────────────────────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌──────────────────────────────┐ ┌─────────────────────────────┐
//! │  Storage (store/)            │ │  Remote services            │
//! │  - DocumentStore trait       │ │  - ai/: diagram generation  │
//! │  - FileStore, InMemoryStore  │ │  - templates/: template API │
//! └──────────────────────────────┘ └─────────────────────────────┘
//! ```
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits the process.
//! Problems a user should see but that do not stop the operation (a fallback diagram, an
//! unreachable template service) travel as [`commands::CmdMessage`]s; everything else is a
//! [`error::StudioError`].
//!
//! ## Degraded Modes
//!
//! Two operations keep working when the network does not:
//!
//! - Diagram generation answers with a canned diagram chosen by keyword, explicitly marked
//!   as a fallback ([`ai::DiagramSource::Fallback`]).
//! - Template listing answers with the bundled templates ([`templates::TemplateFetch`]).
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: unit tests against [`store::memory::InMemoryStore`].
//! 2. **API / host**: dispatch tests, async tests on a tokio test runtime.
//! 3. **CLI**: `tests/cli.rs` runs the binary against a temporary `FLOWSTUDIO_HOME`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Business logic for each command
//! - [`host`]: Async boundary used by the editor UI
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Documents, review comments, RAG pairs, metrics
//! - [`encoder`]: PlantUML text to render token and back
//! - [`markdown`]: Diagram block extraction from Markdown
//! - [`ai`]: Diagram generation through chat-completion providers
//! - [`templates`]: Template service client and bundled templates
//! - [`http`]: Shared HTTP agent setup
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod ai;
pub mod api;
pub mod commands;
pub mod config;
pub mod encoder;
pub mod error;
pub mod host;
pub mod http;
pub mod markdown;
pub mod model;
pub mod store;
pub mod templates;
