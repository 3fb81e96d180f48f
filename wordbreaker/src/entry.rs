#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String;

use crate::HashMap;

/// Append-only log of `(iteration, value)` records
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "with-serde", serde(transparent))]
#[derive(Clone, Debug, PartialEq)]
pub struct Series<T> {
    records: Vec<(usize, T)>,
}

impl<T> Series<T> {
    pub fn push(&mut self, iteration: usize, value: T) {
        debug_assert!(self.records.last().map_or(true, |(i, _)| *i <= iteration));
        self.records.push((iteration, value));
    }

    pub fn last(&self) -> Option<&(usize, T)> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (usize, T)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Series<T> {
    type Item = &'a (usize, T);
    type IntoIter = std::slice::Iter<'a, (usize, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Usage statistics for one unit of the lexicon
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone, Debug)]
pub struct LexiconEntry {
    key: String,
    chars: usize,
    count: u64,
    frequency: f64,
    history: Series<u64>,
}

impl LexiconEntry {
    pub fn new(key: &str, count: u64) -> Self {
        Self {
            key: key.into(),
            chars: key.chars().count(),
            count,
            frequency: 0.0,
            history: Series::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Length of the key in characters
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_letter(&self) -> bool {
        self.chars == 1
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Bits needed to encode one use of this unit
    pub fn cost(&self) -> f64 {
        -self.frequency.log2()
    }

    /// Counts recorded at resets, only where the count changed
    pub fn history(&self) -> &Series<u64> {
        &self.history
    }

    /// Record the count accumulated before the pass for `iteration`
    ///
    /// The first record is tagged `iteration`. Later counts belong to the previous pass, so
    /// they are tagged `iteration - 1`, and only if they differ from the last recorded count.
    pub(crate) fn freeze(&mut self, iteration: usize) {
        match self.history.last() {
            None => self.history.push(iteration, self.count),
            Some(&(_, last)) if last == self.count => {}
            Some(_) => self.history.push(iteration.saturating_sub(1), self.count),
        }
    }

    pub(crate) fn set_count(&mut self, count: u64) {
        self.count = count;
    }
}

/// The lexicon entries, kept in insertion order and indexed by key
#[derive(Clone, Debug, Default)]
pub struct EntryStore {
    entries: Vec<LexiconEntry>,
    index: HashMap<String, usize>,
    longest: usize,
}

impl EntryStore {
    /// Add a new entry; returns `false` and leaves the store unchanged if `key` exists
    pub fn insert(&mut self, key: &str, count: u64) -> bool {
        if self.index.contains_key(key) {
            return false;
        }

        let entry = LexiconEntry::new(key, count);
        self.longest = self.longest.max(entry.len());
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&LexiconEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LexiconEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upper bound on the length in characters of any key
    ///
    /// Grows when a longer entry is added and is not lowered when entries are removed.
    pub fn longest(&self) -> usize {
        self.longest
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut LexiconEntry> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, LexiconEntry> {
        self.entries.iter_mut()
    }

    /// Freeze every count into its history, then zero it
    pub(crate) fn reset(&mut self, iteration: usize) {
        for entry in self.entries.iter_mut() {
            entry.freeze(iteration);
            entry.count = 0;
        }
    }

    /// Keep the entries for which `keep` holds, returning the keys of the others in order
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&LexiconEntry) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| match keep(entry) {
            true => true,
            false => {
                removed.push(entry.key.clone());
                false
            }
        });

        if !removed.is_empty() {
            self.index.clear();
            for (i, entry) in self.entries.iter().enumerate() {
                self.index.insert(entry.key.clone(), i);
            }
        }
        removed
    }

    /// Recompute every frequency against the shared total count
    pub(crate) fn refit(&mut self) {
        let total = self.total_count();
        for entry in self.entries.iter_mut() {
            entry.frequency = match total {
                0 => 0.0,
                _ => entry.count as f64 / total as f64,
            };
        }
    }
}
