use std::ops::{Index, Range};

use smartstring::alias::String;
use tracing::trace;

use crate::entry::EntryStore;
use crate::error::{Error, Result};

/// Finds the cheapest segmentation of a line into lexicon entries
///
/// A unit costs `-log2(frequency)` bits; the segmentation cost is the sum over its units.
/// The segmenter only reads the entry store, so it can be shared freely during a parse pass.
#[derive(Clone, Copy)]
pub struct Segmenter<'a> {
    entries: &'a EntryStore,
    verbose: bool,
}

impl<'a> Segmenter<'a> {
    pub fn new(entries: &'a EntryStore) -> Self {
        Self {
            entries,
            verbose: false,
        }
    }

    /// Emit a `trace` event for every candidate unit examined
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Segment `input`, which must not contain spaces
    ///
    /// The `search` parameter holds the buffers used during segmentation; passing it in allows
    /// callers to reuse the allocations across lines. Fails with `Unsegmentable` if no known
    /// unit ends at some offset, which cannot happen while every character of `input` is an
    /// entry with non-zero frequency.
    pub fn segment(&self, input: &str, search: &mut Search) -> Result<Segmentation> {
        let line = Line::new(input);
        search.clear(line.len());

        // Unit starts are scanned left to right and only a strictly smaller cost replaces the
        // current best, so ties go to the leftmost start.
        let window = self.entries.longest();
        for end in 1..=line.len() {
            let mut best = None;
            for start in end.saturating_sub(window)..end {
                let prefix = search.cost[start];
                if !prefix.is_finite() {
                    continue;
                }

                let piece = &line[start..end];
                let entry = match self.entries.get(piece) {
                    Some(entry) => entry,
                    None => {
                        if self.verbose {
                            trace!(end, start, piece, "not in lexicon");
                        }
                        continue;
                    }
                };

                let cost = prefix + entry.cost();
                if self.verbose {
                    trace!(end, start, piece, bits = cost, "candidate");
                }
                if cost.is_finite() && best.map_or(true, |(_, min)| cost < min) {
                    best = Some((start, cost));
                }
            }

            let (start, cost) = best.ok_or_else(|| Error::Unsegmentable {
                text: input.to_owned(),
                position: end,
            })?;
            if self.verbose {
                trace!(end, chosen = &line[start..end], bits = cost, "best unit");
            }
            search.cost[end] = cost;
            search.back[end] = start;
        }

        let mut units = Vec::new();
        let mut end = line.len();
        while end > 0 {
            let start = search.back[end];
            units.push(String::from(&line[start..end]));
            end = start;
        }
        units.reverse();

        Ok(Segmentation {
            units,
            cost: search.cost[line.len()],
        })
    }
}

/// Reusable buffers for [`Segmenter::segment()`]
#[derive(Clone, Debug, Default)]
pub struct Search {
    /// Cheapest cost of segmenting the first `n` characters
    cost: Vec<f64>,
    /// Start of the last unit of that cheapest segmentation
    back: Vec<usize>,
}

impl Search {
    fn clear(&mut self, len: usize) {
        self.cost.clear();
        self.cost.resize(len + 1, f64::INFINITY);
        self.cost[0] = 0.0;
        self.back.clear();
        self.back.resize(len + 1, 0);
    }
}

/// A segmented line and its cost in bits
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    units: Vec<String>,
    cost: f64,
}

impl Segmentation {
    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn breakpoints(&self) -> Vec<usize> {
        crate::breakpoints(&self.units)
    }

    pub fn into_units(self) -> Vec<String> {
        self.units
    }
}

/// Text indexed by character offsets
#[derive(Debug)]
struct Line<'a> {
    text: &'a str,
    /// Byte offset of every character, plus the length of `text`
    bounds: Vec<usize>,
}

impl<'a> Line<'a> {
    fn new(text: &'a str) -> Self {
        let mut bounds = text.char_indices().map(|(i, _)| i).collect::<Vec<_>>();
        bounds.push(text.len());
        Self { text, bounds }
    }

    /// Length in characters
    fn len(&self) -> usize {
        self.bounds.len() - 1
    }
}

impl<'a> Index<Range<usize>> for Line<'a> {
    type Output = str;

    fn index(&self, index: Range<usize>) -> &Self::Output {
        &self.text[self.bounds[index.start]..self.bounds[index.end]]
    }
}
