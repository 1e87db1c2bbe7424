//! GenerationBackend trait definition.

use parley_types::generation::{GenerationError, GenerationRequest};

/// Trait for text-generation backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). A call either
/// yields the reply text or a typed [`GenerationError`]; it never panics and
/// never retries on its own.
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g. "groq").
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Produce one persona reply for the request.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
