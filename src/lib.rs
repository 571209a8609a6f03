//! Toolchat — tool-calling chat orchestration.
//!
//! Holds one multi-turn conversation with an LLM provider that may invoke
//! externally registered tools mid-conversation. Provider-specific message
//! shapes and streaming formats are normalized into one canonical model and
//! one canonical stream of events.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolchat::prelude::*;
//! use toolchat::history::JsonlHistoryStore;
//! use toolchat::strategy::DemoStrategy;
//!
//! # async fn example() -> toolchat::error::Result<()> {
//! let config = ChatConfig::from_env()?;
//! let provider = Arc::new(ProviderAdapter::from_config(&config)?);
//! let history = Arc::new(JsonlHistoryStore::new(config.history_file.clone()));
//! let runner = ChatRunner::new(provider, Arc::new(DemoStrategy::new()), history)
//!     .with_limits(config.limits);
//!
//! let sink = toolchat::chat_loop::stdout_sink();
//! let result = runner.run(Message::user("Which red widgets are there?"), Some(sink)).await?;
//! println!("{:?}", result.status);
//! # Ok(())
//! # }
//! ```

pub mod chat_loop;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod normalize;
pub mod prelude;
pub mod provider;
pub mod state;
pub mod strategy;
pub mod tools;
pub mod translate;
pub mod types;
