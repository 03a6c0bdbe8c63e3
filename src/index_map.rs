use std::collections::HashMap;

/// A string-keyed map that iterates in insertion order.
#[derive(Debug)]
pub(crate) struct IndexMap<V> {
	vec: Vec<V>,
	map: HashMap<String, usize>,
}

impl<V> IndexMap<V> {
	pub(crate) fn new() -> Self {
		IndexMap { vec: Vec::new(), map: HashMap::new() }
	}
	pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
		self.map.get(key).copied()
	}
	/// Inserts `val` unless `key` is already present. Returns the index of the entry and
	/// whether it was inserted.
	pub(crate) fn insert_if_absent(&mut self, key: &str, val: impl FnOnce() -> V) -> (usize, bool) {
		if let Some(index) = self.index_of(key) {
			return (index, false);
		}
		let index = self.vec.len();
		self.map.insert(key.to_owned(), index);
		self.vec.push(val());
		(index, true)
	}
	pub(crate) fn at(&self, index: usize) -> &V {
		&self.vec[index]
	}
	pub(crate) fn at_mut(&mut self, index: usize) -> &mut V {
		&mut self.vec[index]
	}
	pub(crate) fn len(&self) -> usize {
		self.vec.len()
	}
	pub(crate) fn iter(&self) -> std::slice::Iter<'_, V> {
		self.vec.iter()
	}
}

impl<'map, V> IntoIterator for &'map IndexMap<V> {
	type Item = &'map V;
	type IntoIter = std::slice::Iter<'map, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::IndexMap;

	#[test]
	fn keeps_insertion_order() {
		let mut map = IndexMap::new();
		assert_eq!(map.insert_if_absent("b", || 1), (0, true));
		assert_eq!(map.insert_if_absent("a", || 2), (1, true));
		assert_eq!(map.insert_if_absent("b", || 3), (0, false));
		assert_eq!(map.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
		assert_eq!(map.index_of("a").map(|x| *map.at(x)), Some(2));
		assert_eq!(map.len(), 2);
	}
}
