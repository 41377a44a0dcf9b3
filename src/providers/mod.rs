//! Reply generators: the expensive operation the gate protects.

pub mod chat_completions;
pub mod fallback;
pub mod retry;
pub mod traits;

pub use chat_completions::ChatCompletionsClient;
pub use fallback::FallbackGenerator;
pub use retry::{RetryConfig, RetryingGenerator};
pub use traits::ReplyGenerator;
