//! # Embedding Providers
//!
//! The detector only needs "text in, fixed-length vector out". Any model
//! (local, remote, or a test stub) plugs in through [`Embedder`].

pub mod hashed;

pub use hashed::HashedEmbedder;

use crate::error::EmbeddingError;

/// Maps text content to a fixed-dimension vector.
///
/// Must be a pure function of its input; every vector produced within one
/// run must have the same dimension.
pub trait Embedder: Send + Sync {
	fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

impl<F> Embedder for F
where
	F: Fn(&str) -> Result<Vec<f32>, EmbeddingError> + Send + Sync,
{
	fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
		self(text)
	}
}
