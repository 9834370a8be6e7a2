// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

/// A link to the next node at some level, addressed by arena slot. `None`
/// marks the end of the level.
pub(crate) type Link = Option<usize>;

/// A node in the skiplist. The head node is the only one without an entry.
#[derive(Debug)]
pub(crate) struct SkipNode<K, V> {
    entry: Option<(K, V)>,
    /// `forward[i]` is the next node at level `i`; a node spans
    /// `0..forward.len()`.
    pub(crate) forward: Box<[Link]>,
}

impl<K, V> SkipNode<K, V> {
    pub(crate) fn head(max_level: usize) -> Self {
        SkipNode {
            entry: None,
            forward: vec![None; max_level + 1].into_boxed_slice(),
        }
    }

    pub(crate) fn new(key: K, value: V, height: usize) -> Self {
        SkipNode {
            entry: Some((key, value)),
            forward: vec![None; height + 1].into_boxed_slice(),
        }
    }

    /// Index of the highest level this node is linked into.
    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.forward.len() - 1
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, v)| v)
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<(&K, &V)> {
        self.entry.as_ref().map(|(k, v)| (k, v))
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> Option<(&K, &mut V)> {
        self.entry.as_mut().map(|(k, v)| (&*k, v))
    }

    pub(crate) fn into_entry(self) -> Option<(K, V)> {
        self.entry
    }
}
