//! Ordered provider fallback chain.
//!
//! [`FallbackGenerator`] holds generators in priority order (index 0 =
//! highest) and tries them until one succeeds or one fails with an error
//! that another provider cannot fix.
//!
//! # Fallback Triggers
//!
//! The chain moves to the next provider on:
//! - transient errors (after that provider's own retries, if wrapped)
//! - `AuthenticationFailed`, `ModelNotFound`, `EmptyResponse`: each provider
//!   has its own key, model catalogue and quirks
//! - non-transient `Api` errors (e.g. a 400 from one provider's validator)
//!
//! `InvalidInput`, `Json` and configuration errors stop the chain: the
//! request itself is the problem.
//!
//! ```text
//!  generate(request)
//!        │
//!        ▼
//!   groq ──✗ 503──▶ openrouter ──✗ 401──▶ huggingface ──✓──▶ reply
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::traits::ReplyGenerator;
use crate::telemetry;
use crate::types::ReplyRequest;
use crate::{HuginnError, Result};

/// Generator that tries a list of providers in order.
#[derive(Default)]
pub struct FallbackGenerator {
    generators: Vec<Arc<dyn ReplyGenerator>>,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority.
    pub fn with(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    /// Append a provider at the lowest priority.
    pub fn push(&mut self, generator: Arc<dyn ReplyGenerator>) {
        self.generators.push(generator);
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }
}

fn should_fall_back(err: &HuginnError) -> bool {
    match err {
        HuginnError::InvalidInput(_)
        | HuginnError::Json(_)
        | HuginnError::Configuration(_)
        | HuginnError::NoProvider => false,
        HuginnError::Http(_)
        | HuginnError::Api { .. }
        | HuginnError::RateLimited { .. }
        | HuginnError::AuthenticationFailed
        | HuginnError::ModelNotFound(_)
        | HuginnError::EmptyResponse => true,
    }
}

#[async_trait]
impl ReplyGenerator for FallbackGenerator {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<String> {
        let mut last_err = None;
        for (index, generator) in self.generators.iter().enumerate() {
            match generator.generate(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if should_fall_back(&e) => {
                    if let Some(next) = self.generators.get(index + 1) {
                        metrics::counter!(telemetry::FALLBACKS_TOTAL,
                            "provider" => generator.name().to_owned(),
                        )
                        .increment(1);
                        warn!(
                            provider = generator.name(),
                            next = next.name(),
                            error = %e,
                            "provider failed, falling back"
                        );
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(HuginnError::NoProvider))
    }
}
