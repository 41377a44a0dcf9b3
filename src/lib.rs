//! Huginn - response cache and rate-limit gate for persona chat assistants
//!
//! A chat assistant backed by third-party LLM providers pays for every
//! reply. This crate puts one reusable admission layer in front of that
//! expensive call:
//!
//! - [`BoundedCache`]: capacity-bounded LRU store for generated replies.
//! - [`RateLimiter`]: per-requester fixed-window counter.
//! - [`ResponseGate`]: cache first (hits bypass the limiter), then the
//!   limiter, then the generator.
//!
//! The generator is any async closure, or a [`ReplyGenerator`] such as the
//! OpenAI-compatible [`ChatCompletionsClient`] for Groq, OpenRouter and
//! HuggingFace.
//!
//! # Example
//!
//! ```rust
//! use huginn::{Resolution, ResponseGate};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> huginn::Result<()> {
//! let gate = ResponseGate::builder().name("ai-reply").build()?;
//!
//! let reply = gate
//!     .resolve("weather:berlin", 4242_i64, || async {
//!         Ok::<_, huginn::HuginnError>("Sunny and 21°C.".to_string())
//!     })
//!     .await?;
//!
//! match reply {
//!     Resolution::Throttled { retry_after } => println!("slow down ({retry_after:?})"),
//!     other => println!("{}", other.into_value().unwrap_or_default()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod limiter;
pub mod providers;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{BoundedCache, CacheConfig, CacheStats, ReplyKey};
pub use config::{Config, Secrets};
pub use error::{HuginnError, Result};
pub use gate::{GateStats, Purged, Resolution, ResponseGate, ResponseGateBuilder};
pub use limiter::{Admission, RateLimitConfig, RateLimiter, RateWindow, RequesterKey};
pub use providers::{
    ChatCompletionsClient, FallbackGenerator, ReplyGenerator, RetryConfig, RetryingGenerator,
};
pub use types::ReplyRequest;
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};
