// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    iter::{
        self,
        FusedIterator,
    },
    mem,
};

use tracing::{
    debug,
    instrument,
    trace,
};

use crate::{
    config::{
        validate_max_level,
        Config,
    },
    errs::SkipListError,
    skiplist::{
        arena::Arena,
        level_generator::{
            GeometricalLevelGenerator,
            LevelGenerator,
        },
        skipnode::{
            Link,
            SkipNode,
        },
    },
};

/// Arena slot of the sentinel head. It is allocated first and never freed.
const HEAD: usize = 0;

/// An ordered map backed by a skiplist.
///
/// Every node lives in an arena owned by the map, and the per-level chains
/// are stored as arena indices. The head spans all `max_level + 1` levels and
/// is the only entry point for traversal.
///
/// Node heights come from the `G` level generator, drawn once for each new
/// key. Re-inserting a key replaces its value without touching the links.
pub struct OrderedMap<K, V, G = GeometricalLevelGenerator> {
    arena: Arena<SkipNode<K, V>>,
    levels: G,
    max_level: usize,
    len: usize,
}

impl<K, V> OrderedMap<K, V>
where
    K: Ord,
{
    /// Create a map whose nodes span at most `max_level + 1` levels, each
    /// node being promoted to the next level with `promotion_probability`.
    pub fn new(max_level: usize, promotion_probability: f64) -> Result<Self, SkipListError> {
        Ok(Self::with_config(Config::new(
            max_level,
            promotion_probability,
        )?))
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_parts(GeometricalLevelGenerator::from_config(config))
    }
}

impl<K, V, G> OrderedMap<K, V, G>
where
    K: Ord,
    G: LevelGenerator,
{
    /// Create a map that draws node heights from `levels`. This is the hook
    /// for seeded or fully deterministic height sequences.
    #[instrument(level = "trace", skip_all)]
    pub fn with_level_generator(levels: G) -> Result<Self, SkipListError> {
        validate_max_level(levels.max_level())?;
        Ok(Self::from_parts(levels))
    }

    fn from_parts(levels: G) -> Self {
        let max_level = levels.max_level();
        let mut arena = Arena::new();
        let head = arena.alloc(SkipNode::head(max_level));
        debug_assert_eq!(head, HEAD);
        debug!(max_level, "created ordered map");

        OrderedMap {
            arena,
            levels,
            max_level,
            len: 0,
        }
    }

    /// Map `key` to `value`, returning the value it replaced if the key was
    /// already present.
    #[instrument(level = "trace", skip_all)]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let predecessors = self.predecessors(&key);

        if let Some(next) = self.arena[predecessors[0]].forward[0] {
            if let Some((existing, slot)) = self.arena[next].entry_mut() {
                if *existing == key {
                    trace!("replaced value in place");
                    return Some(mem::replace(slot, value));
                }
            }
        }

        let height = self.draw_height();
        let mut node = SkipNode::new(key, value, height);
        for (level, &pred) in predecessors.iter().enumerate().take(height + 1) {
            node.forward[level] = self.arena[pred].forward[level];
        }

        let id = self.arena.alloc(node);
        for (level, &pred) in predecessors.iter().enumerate().take(height + 1) {
            self.arena[pred].forward[level] = Some(id);
        }
        self.len += 1;

        trace!(height, len = self.len, "linked new node");
        None
    }

    /// Remove `key`, returning its value. Removing an absent key changes
    /// nothing.
    #[instrument(level = "trace", skip_all)]
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // one descent per level, a predecessor is only kept where the key
        // itself was seen
        let mut predecessors: Vec<Link> = vec![None; self.max_level + 1];
        let mut cursor = HEAD;
        for level in (0..=self.max_level).rev() {
            while let Some((next, next_key)) = self.successor(cursor, level) {
                match <K as Borrow<Q>>::borrow(next_key).cmp(key) {
                    | Ordering::Less => cursor = next,
                    | Ordering::Equal => {
                        predecessors[level] = Some(cursor);
                        break;
                    },
                    | Ordering::Greater => break,
                }
            }
        }

        let target = match predecessors[0] {
            | Some(pred) => self.arena[pred].forward[0]?,
            | None => {
                trace!("key not present");
                return None;
            },
        };

        let mut unlinked = 0;
        for (level, pred) in predecessors.iter().enumerate() {
            if let Some(pred) = *pred {
                let next = self.arena[target].forward[level];
                self.arena[pred].forward[level] = next;
                unlinked += 1;
            }
        }
        self.len -= 1;
        let removed = self.arena.free(target);
        debug_assert_eq!(self.arena.occupied(), self.len + 1);

        trace!(levels = unlinked, len = self.len, "unlinked node");
        removed
            .and_then(SkipNode::into_entry)
            .map(|(_, value)| value)
    }

    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).and_then(|id| self.arena[id].value())
    }

    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.locate(key)?;
        self.arena[id].entry_mut().map(|(_, value)| value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Walk down from the top level, stopping as soon as any level reaches
    /// `key`.
    fn locate<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = HEAD;
        for level in (0..=self.max_level).rev() {
            while let Some((next, next_key)) = self.successor(cursor, level) {
                match <K as Borrow<Q>>::borrow(next_key).cmp(key) {
                    | Ordering::Less => cursor = next,
                    | Ordering::Equal => return Some(next),
                    | Ordering::Greater => break,
                }
            }
        }
        None
    }

    /// For each level, the last node whose key is strictly less than `key`.
    fn predecessors(&self, key: &K) -> Vec<usize> {
        let mut predecessors = vec![HEAD; self.max_level + 1];
        let mut cursor = HEAD;
        for level in (0..=self.max_level).rev() {
            while let Some((next, next_key)) = self.successor(cursor, level) {
                if next_key >= key {
                    break;
                }
                cursor = next;
            }
            predecessors[level] = cursor;
        }
        predecessors
    }

    fn draw_height(&mut self) -> usize {
        let height = self.levels.random();
        debug_assert!(
            height <= self.max_level,
            "level generator produced {height}, max is {}",
            self.max_level
        );
        height.min(self.max_level)
    }
}

impl<K, V, G> OrderedMap<K, V, G> {
    /// Number of entries, kept up to date by `insert` and `delete`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Count the entries by walking level 0.
    pub fn count(&self) -> usize {
        self.level_zero().count()
    }

    /// The highest level index with at least one node on it, or 0 when only
    /// level 0 (or nothing) is in use. This can be `max_level` itself.
    pub fn effective_height(&self) -> usize {
        let head = &self.arena[HEAD];
        (1..=self.max_level)
            .rev()
            .find(|&level| head.forward[level].is_some())
            .unwrap_or(0)
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn level_generator(&self) -> &G {
        &self.levels
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: &self.arena,
            next: self.arena[HEAD].forward[0],
            remaining: self.len,
        }
    }

    /// Drop every entry. The level generator keeps its state.
    #[instrument(level = "trace", skip_all)]
    pub fn clear(&mut self) {
        self.arena.truncate(HEAD + 1);
        self.arena[HEAD].forward.fill(None);
        self.len = 0;
    }

    /// Arena indices of every node, in key order.
    fn level_zero(&self) -> impl Iterator<Item = usize> + '_ {
        iter::successors(self.arena[HEAD].forward[0], move |&id| {
            self.arena[id].forward[0]
        })
    }

    /// The successor of `node` at `level`, paired with its key.
    #[inline]
    fn successor(&self, node: usize, level: usize) -> Option<(usize, &K)> {
        let next = self.arena[node].forward[level]?;
        self.arena[next].key().map(|key| (next, key))
    }
}

impl<K, V, G> OrderedMap<K, V, G>
where
    V: fmt::Display,
{
    /// Lay the map out level by level, highest first, with one column per
    /// entry in key order. Columns are tab separated and a node missing from
    /// a level shows as `-`. Meant for debugging, not as a stable format.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl<K, V, G> fmt::Display for OrderedMap<K, V, G>
where
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<&SkipNode<K, V>> = self.level_zero().map(|id| &self.arena[id]).collect();

        for level in (0..=self.max_level).rev() {
            for (column, node) in nodes.iter().enumerate() {
                if column > 0 {
                    f.write_str("\t")?;
                }
                match node.value() {
                    | Some(value) if node.height() >= level => write!(f, "{value}")?,
                    | _ => f.write_str("-")?,
                }
            }
            if level > 0 {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

impl<K, V, G> fmt::Debug for OrderedMap<K, V, G>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Ord,
{
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K, V, G> Extend<(K, V)> for OrderedMap<K, V, G>
where
    K: Ord,
    G: LevelGenerator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, G> IntoIterator for &'a OrderedMap<K, V, G> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the entries of an [`OrderedMap`].
pub struct Iter<'a, K, V> {
    arena: &'a Arena<SkipNode<K, V>>,
    next: Link,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let node = &arena[self.next?];
        self.next = node.forward[0];
        self.remaining = self.remaining.saturating_sub(1);
        node.entry()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
impl<K, V, G> OrderedMap<K, V, G>
where
    K: Ord,
{
    /// Height of the node holding `key`, if any.
    pub(crate) fn height_of(&self, key: &K) -> Option<usize> {
        self.level_zero()
            .map(|id| &self.arena[id])
            .find(|node| node.key() == Some(key))
            .map(SkipNode::height)
    }

    /// Check every structural invariant: strict ordering on each level, the
    /// nested-prefix property, height bounds and bookkeeping.
    pub(crate) fn assert_invariants(&self) {
        let head = &self.arena[HEAD];
        assert_eq!(head.height(), self.max_level, "head must span every level");

        let ids: Vec<usize> = self.level_zero().collect();
        assert_eq!(ids.len(), self.len, "len out of sync with level 0");
        assert_eq!(self.arena.occupied(), self.len + 1, "leaked arena slots");

        for pair in ids.windows(2) {
            assert!(
                self.arena[pair[0]].key() < self.arena[pair[1]].key(),
                "level 0 is not strictly increasing"
            );
        }

        for level in 0..=self.max_level {
            // each level must be exactly the level 0 nodes tall enough for it
            let expected: Vec<usize> = ids
                .iter()
                .copied()
                .filter(|&id| self.arena[id].height() >= level)
                .collect();
            let actual: Vec<usize> = iter::successors(head.forward[level], |&id| {
                self.arena[id].forward[level]
            })
            .collect();
            assert_eq!(actual, expected, "level {level} diverged from level 0");
        }

        for &id in &ids {
            assert!(self.arena[id].height() <= self.max_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::iter;

    use super::OrderedMap;
    use crate::{
        config::{
            Config,
            MAX_LEVEL_LIMIT,
        },
        errs::SkipListError,
        skiplist::level_generator::{
            CoinFlipLevelGenerator,
            GeometricalLevelGenerator,
        },
    };

    /// A map whose node heights follow `flips`, then stay at zero.
    fn scripted<K: Ord, V>(
        max_level: usize,
        flips: Vec<bool>,
    ) -> OrderedMap<K, V, CoinFlipLevelGenerator<impl FnMut() -> bool>> {
        let mut flips = flips.into_iter().chain(iter::repeat(false));
        let generator =
            CoinFlipLevelGenerator::new(max_level, move || flips.next().unwrap_or(false)).unwrap();
        OrderedMap::with_level_generator(generator).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let mut map = OrderedMap::new(4, 0.5).unwrap();
        map.insert(5, "a");
        map.insert(3, "b");
        map.insert(8, "c");

        assert_eq!(map.find(&3), Some(&"b"));
        assert_eq!(map.find(&5), Some(&"a"));
        assert_eq!(map.find(&8), Some(&"c"));
        assert_eq!(map.find(&9), None);
        assert_eq!(map.count(), 3);
        assert_eq!(map.len(), 3);
        map.assert_invariants();
    }

    #[test]
    fn test_insert_overwrites() {
        let mut map = OrderedMap::new(4, 0.5).unwrap();
        assert_eq!(map.insert(5, "a"), None);
        assert_eq!(map.insert(5, "z"), Some("a"));

        assert_eq!(map.find(&5), Some(&"z"));
        assert_eq!(map.count(), 1);
        map.assert_invariants();
    }

    #[test]
    fn test_overwrite_keeps_height() {
        // the second insert would draw height 3 if it drew at all
        let mut map = scripted(3, vec![true, false, true, true, true]);
        map.insert(1, 'a');
        assert_eq!(map.height_of(&1), Some(1));

        map.insert(1, 'b');
        assert_eq!(map.height_of(&1), Some(1));
        assert_eq!(map.find(&1), Some(&'b'));

        map.insert(2, 'c');
        assert_eq!(map.height_of(&2), Some(3), "overwrite must not consume flips");
        map.assert_invariants();
    }

    #[test]
    fn test_delete() {
        let mut map = OrderedMap::new(4, 0.5).unwrap();
        map.insert(1, "x");

        assert_eq!(map.delete(&1), Some("x"));
        assert_eq!(map.find(&1), None);
        assert_eq!(map.count(), 0);
        assert!(map.is_empty());

        assert_eq!(map.delete(&1), None);
        assert_eq!(map.count(), 0);
        map.assert_invariants();
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut map = scripted(3, vec![true, false, false, true, true, false]);
        for (k, v) in [(10, 1), (20, 2), (30, 3)] {
            map.insert(k, v);
        }
        let before = map.render();

        for key in [5, 15, 25, 35] {
            assert_eq!(map.delete(&key), None);
        }
        assert_eq!(map.render(), before);
        assert_eq!(map.count(), 3);
        map.assert_invariants();
    }

    #[test]
    fn test_delete_unlinks_every_level() {
        let mut map = scripted(3, vec![true, true, true, true, false]);
        map.insert(7, "top");
        map.insert(4, "mid");
        assert_eq!(map.height_of(&7), Some(3));
        assert_eq!(map.height_of(&4), Some(1));
        assert_eq!(map.effective_height(), 3);

        map.delete(&7);
        assert_eq!(map.effective_height(), 1);
        map.assert_invariants();

        map.delete(&4);
        assert_eq!(map.effective_height(), 0);
        map.assert_invariants();
    }

    #[test]
    fn test_top_level_stays_ordered() {
        let mut map = scripted(2, vec![true; 6]);
        map.insert(10, ());
        map.insert(5, ());
        map.insert(7, ());

        assert_eq!(map.height_of(&5), Some(2));
        assert_eq!(map.height_of(&7), Some(2));
        assert_eq!(map.height_of(&10), Some(2));
        map.assert_invariants();
        assert_eq!(map.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![5, 7, 10]);
    }

    #[test]
    fn test_flat_list_still_finds() {
        let generator = CoinFlipLevelGenerator::new(4, || false).unwrap();
        let mut map = OrderedMap::with_level_generator(generator).unwrap();
        for key in (0..100).rev() {
            map.insert(key, key * 10);
        }

        assert_eq!(map.effective_height(), 0);
        for key in 0..100 {
            assert_eq!(map.height_of(&key), Some(0));
            assert_eq!(map.find(&key), Some(&(key * 10)));
        }
        assert_eq!(map.find(&-1), None);
        assert_eq!(map.find(&100), None);

        for key in (0..100).step_by(2) {
            assert_eq!(map.delete(&key), Some(key * 10));
        }
        assert_eq!(map.count(), 50);
        assert_eq!(map.find(&3), Some(&30));
        assert_eq!(map.find(&4), None);
        map.assert_invariants();
    }

    #[test]
    fn test_render() {
        // 5 gets height 1, 3 gets height 0, 8 gets height 2
        let mut map = scripted(2, vec![true, false, false, true, true]);
        map.insert(5, "a");
        map.insert(3, "b");
        map.insert(8, "c");

        assert_eq!(map.render(), "-\t-\tc\n-\ta\tc\nb\ta\tc");
        assert_eq!(map.to_string(), map.render());
    }

    #[test]
    fn test_render_empty() {
        let map: OrderedMap<u32, &str> = OrderedMap::new(2, 0.5).unwrap();
        assert_eq!(map.render(), "\n\n");
    }

    #[test]
    fn test_effective_height() {
        let mut map = scripted(4, vec![false, true, true, false]);
        assert_eq!(map.effective_height(), 0);

        map.insert(1, ());
        assert_eq!(map.effective_height(), 0);

        map.insert(2, ());
        assert_eq!(map.effective_height(), 2);
    }

    #[test]
    fn test_zero_max_level() {
        let mut map = OrderedMap::new(0, 1.0).unwrap();
        for key in [3, 1, 2] {
            map.insert(key, key);
        }
        assert_eq!(map.effective_height(), 0);
        assert_eq!(map.height_of(&3), Some(0));
        assert_eq!(map.delete(&1), Some(1));
        assert_eq!(map.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![2, 3]);
        map.assert_invariants();
    }

    #[test]
    fn test_iter_and_debug() {
        let mut map: OrderedMap<i32, &str> = OrderedMap::default();
        map.extend([(3, "b"), (1, "x"), (2, "y")]);

        let iter = map.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(
            iter.collect::<Vec<_>>(),
            vec![(&1, &"x"), (&2, &"y"), (&3, &"b")]
        );
        assert_eq!(format!("{map:?}"), r#"{1: "x", 2: "y", 3: "b"}"#);

        let mut keys = Vec::new();
        for (k, _) in &map {
            keys.push(*k);
        }
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_mut_and_contains() {
        let mut map = OrderedMap::new(4, 0.5).unwrap();
        map.insert(String::from("apple"), 1);
        map.insert(String::from("pear"), 2);

        if let Some(v) = map.find_mut("pear") {
            *v += 40;
        }
        assert_eq!(map.find("pear"), Some(&42));
        assert!(map.contains_key("apple"));
        assert!(!map.contains_key("plum"));
        assert!(map.find_mut("plum").is_none());
        assert_eq!(map.delete("apple"), Some(1));
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut map = OrderedMap::with_level_generator(GeometricalLevelGenerator::seeded(
            Config::new(6, 0.5).unwrap(),
            11,
        ))
        .unwrap();
        for key in 0..64 {
            map.insert(key, key);
        }
        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.count(), 0);
        assert_eq!(map.effective_height(), 0);
        assert_eq!(map.find(&3), None);
        map.assert_invariants();

        map.insert(3, 9);
        assert_eq!(map.find(&3), Some(&9));
        map.assert_invariants();
    }

    #[test]
    fn test_deleted_slots_are_reused() {
        let mut map = OrderedMap::new(4, 0.5).unwrap();
        for round in 0..10 {
            for key in 0..32 {
                map.insert(key, round);
            }
            for key in 0..32 {
                assert_eq!(map.delete(&key), Some(round));
            }
        }
        // a leaked slot would show up as an occupied arena entry
        map.assert_invariants();
        // head plus one round's worth of nodes, anything more means the
        // free list was never drawn from
        assert!(map.arena.slots() <= 33, "{} slots", map.arena.slots());
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            OrderedMap::<u8, u8>::new(4, 2.0).unwrap_err(),
            SkipListError::InvalidProbability(2.0)
        );
        assert_eq!(
            OrderedMap::<u8, u8>::new(MAX_LEVEL_LIMIT + 1, 0.5).unwrap_err(),
            SkipListError::MaxLevelTooLarge(MAX_LEVEL_LIMIT + 1)
        );
    }
}
