//! Similarity scoring and match decisions

use crate::core::{EmbeddingVector, ExactDigest, FileId, MatchResult};
use crate::error::ConfigError;

/// Cosine similarity in [-1.0, 1.0].
///
/// A zero-magnitude vector scores 0.0 against everything. Vectors are
/// assumed to share a dimension; the detector rejects runs where they do
/// not.
pub fn cosine(a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
	let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
	for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
		let (x, y) = (*x as f64, *y as f64);
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	let score = dot / (norm_a.sqrt() * norm_b.sqrt());
	if score.is_finite() {
		score.clamp(-1.0, 1.0) as f32
	} else {
		0.0
	}
}

/// Whether a similarity score clears the threshold
pub fn is_duplicate(score: f32, threshold: Threshold) -> bool {
	score >= threshold.value()
}

/// Validated similarity threshold in [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f32);

impl Threshold {
	/// Out-of-range values are rejected, never clamped
	pub fn new(value: f32) -> Result<Self, ConfigError> {
		if (0.0..=1.0).contains(&value) {
			Ok(Self(value))
		} else {
			Err(ConfigError::InvalidThreshold(value))
		}
	}

	pub fn value(&self) -> f32 {
		self.0
	}
}

/// Turns fingerprint pairs into match decisions
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
	threshold: Threshold,
}

impl SimilarityMatcher {
	pub fn new(threshold: Threshold) -> Self {
		Self { threshold }
	}

	pub fn score(&self, a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
		cosine(a, b)
	}

	/// Digests match on bitwise equality; the threshold plays no part
	pub fn matches_exact(&self, a: &ExactDigest, b: &ExactDigest) -> bool {
		a == b
	}

	/// Zero or non-finite vectors never match, whatever the threshold
	pub fn match_vectors(
		&self,
		(id_a, a): (&FileId, &EmbeddingVector),
		(id_b, b): (&FileId, &EmbeddingVector),
	) -> Option<MatchResult> {
		if !a.is_comparable() || !b.is_comparable() {
			return None;
		}
		let score = self.score(a, b);
		is_duplicate(score, self.threshold).then(|| MatchResult::cosine(id_a.clone(), id_b.clone(), score))
	}

	pub fn match_digests(
		&self,
		(id_a, a): (&FileId, &ExactDigest),
		(id_b, b): (&FileId, &ExactDigest),
	) -> Option<MatchResult> {
		self.matches_exact(a, b).then(|| MatchResult::exact(id_a.clone(), id_b.clone()))
	}
}
