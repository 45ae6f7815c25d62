//! Feature-hashing text embedder
//!
//! Word unigrams and bigrams are hashed into signed buckets, weighted by
//! sublinear term frequency, and L2-normalised. Needs no model files, and
//! documents sharing most of their wording land close together.

use std::collections::HashMap;

use xxhash_rust::xxh3::xxh3_64_with_seed;

use super::Embedder;
use crate::config::EMBEDDING_DIM;
use crate::core::embedding::normalize;
use crate::error::EmbeddingError;

const UNIGRAM_SEED: u64 = 0x5eed_0001;
const BIGRAM_SEED: u64 = 0x5eed_0002;
const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashedEmbedder {
	dimension: usize,
}

impl HashedEmbedder {
	pub fn new(dimension: usize) -> Self {
		Self {
			dimension: dimension.max(1),
		}
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}
}

impl Default for HashedEmbedder {
	fn default() -> Self {
		Self::new(EMBEDDING_DIM)
	}
}

impl Embedder for HashedEmbedder {
	fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
		let tokens = tokenize(text);
		if tokens.is_empty() {
			return Err(EmbeddingError::EmptyInput);
		}

		let mut counts: HashMap<u64, (u32, f32)> = HashMap::new();
		let hashes: Vec<u64> = tokens
			.iter()
			.map(|t| xxh3_64_with_seed(t.as_bytes(), UNIGRAM_SEED))
			.collect();

		for &h in &hashes {
			counts.entry(h).or_insert((0, 1.0)).0 += 1;
		}
		for pair in hashes.windows(2) {
			let mut key = [0u8; 16];
			key[..8].copy_from_slice(&pair[0].to_le_bytes());
			key[8..].copy_from_slice(&pair[1].to_le_bytes());
			let h = xxh3_64_with_seed(&key, BIGRAM_SEED);
			counts.entry(h).or_insert((0, BIGRAM_WEIGHT)).0 += 1;
		}

		let mut values = vec![0.0f32; self.dimension];
		for (h, (count, weight)) in counts {
			let bucket = (h % self.dimension as u64) as usize;
			let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
			values[bucket] += sign * weight * (1.0 + (count as f32).ln());
		}

		Ok(normalize(&values))
	}
}

/// Lowercased alphanumeric runs
fn tokenize(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|t| !t.is_empty())
		.map(|t| t.to_lowercase())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::EmbeddingVector;
	use crate::processing::similarity::cosine;

	fn embed(text: &str) -> EmbeddingVector {
		EmbeddingVector::new(HashedEmbedder::default().embed(text).unwrap())
	}

	#[test]
	fn test_deterministic_and_fixed_dimension() {
		let a = HashedEmbedder::new(64).embed("The quick brown fox").unwrap();
		let b = HashedEmbedder::new(64).embed("The quick brown fox").unwrap();
		assert_eq!(a, b);
		assert_eq!(a.len(), 64);
	}

	#[test]
	fn test_empty_input_fails() {
		let embedder = HashedEmbedder::default();
		assert!(matches!(embedder.embed(""), Err(EmbeddingError::EmptyInput)));
		assert!(matches!(embedder.embed("  ... \n\t"), Err(EmbeddingError::EmptyInput)));
	}

	#[test]
	fn test_case_and_punctuation_insensitive() {
		let a = embed("Meeting notes: budget approved, hiring paused.");
		let b = embed("meeting NOTES budget approved hiring paused");
		assert!(cosine(&a, &b) > 0.999);
	}

	#[test]
	fn test_near_duplicates_score_higher_than_unrelated() {
		let base = "Quarterly report for the northern region. Revenue grew twelve percent \
			while operating costs stayed flat. The team recommends expanding the pilot program \
			to three additional cities next year.";
		let edited = "Quarterly report for the northern region. Revenue grew twelve percent \
			while operating costs stayed flat. The team recommends expanding the pilot program \
			to four additional cities next year.";
		let unrelated = "Recipe: whisk two eggs with flour and sugar, then bake for twenty minutes.";

		let near = cosine(&embed(base), &embed(edited));
		let far = cosine(&embed(base), &embed(unrelated));
		assert!(near > 0.9, "near-duplicate scored {}", near);
		assert!(far < 0.3, "unrelated text scored {}", far);
	}
}
