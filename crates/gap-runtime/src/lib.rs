//! Gap Runtime - configuration, logging and lifecycle for Gap bots.
//!
//! This crate provides:
//! - Layered configuration (`gap.toml`, `GAP_*` variables, code) via figment
//! - Logging setup on `tracing-subscriber`
//! - [`GapBot`], which owns the handler registry, the REST client and the
//!   webhook listener
//!
//! ```ignore
//! use gap_runtime::GapBot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = GapBot::builder().load_config().build()?;
//!     bot.on_text_matching("^/ping", |update: Update| async move {
//!         println!("ping from {:?}", update.chat_id);
//!     })?;
//!
//!     // Run until Ctrl+C
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use bot::{GapBot, GapBotBuilder};
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, GapConfig, LoggingConfig, ServerConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Provides the logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
