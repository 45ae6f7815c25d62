//! Union-find grouping of pairwise matches

use std::collections::HashMap;

use crate::core::{DuplicateGroup, FileId, MatchMethod, MatchResult};

/// Weakest union seen in a component
#[derive(Debug, Clone)]
struct Witness {
	score: f32,
	pair: (usize, usize),
	method: MatchMethod,
}

/// Consolidates pairwise matches into disjoint duplicate groups.
///
/// Every match unions its endpoints; each connected component of two or
/// more files becomes a group. Similarity is not transitive, so members
/// of a group are only guaranteed to be linked by a chain of matches.
#[derive(Debug, Default)]
pub struct DuplicateGrouper {
	index: HashMap<FileId, usize>,
	ids: Vec<FileId>,
	parent: Vec<usize>,
	rank: Vec<u8>,
	witness: Vec<Option<Witness>>,
}

impl DuplicateGrouper {
	pub fn new() -> Self {
		Self::default()
	}

	fn intern(&mut self, id: &FileId) -> usize {
		if let Some(&idx) = self.index.get(id) {
			return idx;
		}
		let idx = self.ids.len();
		self.index.insert(id.clone(), idx);
		self.ids.push(id.clone());
		self.parent.push(idx);
		self.rank.push(0);
		self.witness.push(None);
		idx
	}

	fn find(&mut self, mut x: usize) -> usize {
		let mut root = x;
		while self.parent[root] != root {
			root = self.parent[root];
		}
		// Path compression
		while self.parent[x] != root {
			let next = self.parent[x];
			self.parent[x] = root;
			x = next;
		}
		root
	}

	/// Record one match. Matches between files already in the same
	/// component do not affect the component's minimum score.
	pub fn add(&mut self, result: &MatchResult) {
		let a = self.intern(&result.a);
		let b = self.intern(&result.b);
		let (root_a, root_b) = (self.find(a), self.find(b));
		if root_a == root_b {
			return;
		}

		let link = Witness {
			score: result.score,
			pair: (a, b),
			method: result.method,
		};
		let weakest = [self.witness[root_a].take(), self.witness[root_b].take(), Some(link)]
			.into_iter()
			.flatten()
			.min_by(|x, y| x.score.total_cmp(&y.score));

		let (child, root) = match self.rank[root_a].cmp(&self.rank[root_b]) {
			std::cmp::Ordering::Less => (root_a, root_b),
			std::cmp::Ordering::Greater => (root_b, root_a),
			std::cmp::Ordering::Equal => {
				self.rank[root_a] += 1;
				(root_b, root_a)
			}
		};
		self.parent[child] = root;
		self.witness[root] = weakest;
	}

	pub fn extend<'a>(&mut self, results: impl IntoIterator<Item = &'a MatchResult>) {
		for result in results {
			self.add(result);
		}
	}

	/// Components of size two or more, members in first-seen order
	pub fn into_groups(mut self) -> Vec<DuplicateGroup> {
		let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
		let mut order: Vec<usize> = Vec::new();
		for idx in 0..self.ids.len() {
			let root = self.find(idx);
			let members = components.entry(root).or_default();
			if members.is_empty() {
				order.push(root);
			}
			members.push(idx);
		}

		order
			.into_iter()
			.filter_map(|root| {
				let members = components.remove(&root)?;
				if members.len() < 2 {
					return None;
				}
				let witness = self.witness[root].take()?;
				let ids: Vec<FileId> = members.iter().map(|&i| self.ids[i].clone()).collect();
				let pair = (self.ids[witness.pair.0].clone(), self.ids[witness.pair.1].clone());
				Some(DuplicateGroup::new(ids, witness.method, witness.score, pair))
			})
			.collect()
	}
}
