//! Generator trait implemented by every reply provider.
//!
//! The gate treats a generator as an opaque, fallible async operation.
//! Decorators ([`RetryingGenerator`](super::RetryingGenerator),
//! [`FallbackGenerator`](super::FallbackGenerator)) implement the same trait,
//! so they compose freely:
//!
//! ```ignore
//! let groq = Arc::new(RetryingGenerator::new(
//!     Arc::new(ChatCompletionsClient::groq(key)),
//!     RetryConfig::default(),
//! ));
//! let chain = FallbackGenerator::new().with(groq).with(openrouter);
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::types::ReplyRequest;

/// Produces AI reply text for a request.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Generate a reply. Network and provider failures surface as errors.
    async fn generate(&self, request: &ReplyRequest) -> Result<String>;
}

#[async_trait]
impl<T: ReplyGenerator + ?Sized> ReplyGenerator for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<String> {
        (**self).generate(request).await
    }
}
