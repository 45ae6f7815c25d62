//! Embedding vectors for text similarity

use serde::Serialize;

/// Fixed-dimension vector produced by an embedding provider.
///
/// Values are kept exactly as the provider returned them; cosine
/// similarity normalises at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
	pub fn new(values: Vec<f32>) -> Self {
		Self(values)
	}

	pub fn as_slice(&self) -> &[f32] {
		&self.0
	}

	pub fn dimension(&self) -> usize {
		self.0.len()
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|x| *x == 0.0)
	}

	/// Has direction: finite components, not all zero
	pub fn is_comparable(&self) -> bool {
		!self.is_zero() && self.0.iter().all(|x| x.is_finite())
	}
}

impl From<Vec<f32>> for EmbeddingVector {
	fn from(values: Vec<f32>) -> Self {
		Self(values)
	}
}

/// Scales a vector to unit length; zero vectors are returned unchanged
pub fn normalize(v: &[f32]) -> Vec<f32> {
	let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm > 0.0 {
		v.iter().map(|x| x / norm).collect()
	} else {
		v.to_vec()
	}
}
