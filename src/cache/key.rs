//! Cache keys for AI replies.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Every request attribute that shapes an AI reply.
///
/// The prompt is trimmed, all other attributes are taken verbatim.
/// Equal keys map to equal cache keys; see [`cache_key`](Self::cache_key)
/// for the collision caveat.
///
/// ```rust
/// # use huginn::ReplyKey;
/// let key = ReplyKey::new("how was your day?")
///     .topic("daily life")
///     .persona_mode("playful")
///     .mood("happy")
///     .deeptalk(false);
/// assert!(key.cache_key().starts_with("reply:"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReplyKey {
    prompt: String,
    topic: Option<String>,
    persona_mode: Option<String>,
    mood: Option<String>,
    deeptalk: bool,
    sulking: bool,
    image_context: Option<String>,
    model: Option<String>,
}

impl ReplyKey {
    pub fn new(prompt: impl AsRef<str>) -> Self {
        Self {
            prompt: prompt.as_ref().trim().to_string(),
            ..Self::default()
        }
    }

    /// Current conversation topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Persona mode the reply is written in.
    pub fn persona_mode(mut self, mode: impl Into<String>) -> Self {
        self.persona_mode = Some(mode.into());
        self
    }

    /// Name of the persona's current mood.
    pub fn mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn deeptalk(mut self, enabled: bool) -> Self {
        self.deeptalk = enabled;
        self
    }

    pub fn sulking(mut self, sulking: bool) -> Self {
        self.sulking = sulking;
        self
    }

    /// Descriptor of an attached image (caption, tags, OCR text).
    pub fn image_context(mut self, descriptor: impl Into<String>) -> Self {
        self.image_context = Some(descriptor.into());
        self
    }

    /// Model override the reply will be generated with. `None` means the
    /// generator's default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub(crate) fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Opaque cache key for this request.
    ///
    /// A 64-bit `DefaultHasher` (SipHash) digest of every attribute, stable
    /// within one process. Distinct attribute sets can in principle collide
    /// and then share a cache slot; at chat-cache sizes the odds are
    /// negligible. `Option` discriminants are hashed, so the same text in
    /// different slots (`topic` vs `mood`) hashes differently.
    pub fn cache_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("reply:{:016x}", hasher.finish())
    }
}
