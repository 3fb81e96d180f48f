#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String;

use crate::corpus::Corpus;
use crate::entry::{EntryStore, Series};
use crate::error::{Error, Result};
use crate::eval::PrecisionRecall;
use crate::{HashMap, HashSet};

/// Unigram model over single characters, used to price the spelling of entries
#[derive(Clone, Debug, Default)]
pub struct LetterModel {
    letters: HashMap<char, Letter>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Letter {
    count: u64,
    frequency: f64,
    plog: f64,
}

impl LetterModel {
    pub(crate) fn observe(&mut self, letter: char) {
        self.letters.entry(letter).or_default().count += 1;
    }

    pub(crate) fn refit(&mut self) {
        let total = self.letters.values().map(|l| l.count).sum::<u64>() as f64;
        for letter in self.letters.values_mut() {
            letter.frequency = letter.count as f64 / total;
            letter.plog = -letter.frequency.log2();
        }
    }

    pub fn frequency(&self, letter: char) -> Option<f64> {
        self.letters.get(&letter).map(|l| l.frequency)
    }

    /// Bits needed to encode `letter`
    pub fn plog(&self, letter: char) -> Option<f64> {
        self.letters.get(&letter).map(|l| l.plog)
    }

    /// Bits needed to spell out `key` letter by letter
    pub fn spelling_cost(&self, key: &str) -> Result<f64> {
        key.chars()
            .map(|c| self.plog(c).ok_or(Error::UnknownLetter(c)))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

/// A multi-character entry that was pruned, and the iteration it happened in
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deletion {
    pub iteration: usize,
    pub key: String,
}

/// Per-iteration record of costs and scores
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histories {
    pub dictionary_length: Series<f64>,
    pub corpus_cost: Series<f64>,
    pub break_based: Series<PrecisionRecall>,
    pub token_based: Series<PrecisionRecall>,
    pub type_based: Series<PrecisionRecall>,
}

/// All state of one induction run
///
/// Owned by the induction loop; the segmenter and evaluator only ever see it through shared
/// references.
#[derive(Clone, Debug)]
pub struct Lexicon {
    pub(crate) entries: EntryStore,
    pub(crate) letters: LetterModel,
    pub(crate) corpus: Corpus,
    pub(crate) parsed: Vec<Vec<String>>,
    pub(crate) deleted: Vec<Deletion>,
    pub(crate) blacklist: HashSet<String>,
    pub(crate) histories: Histories,
    pub(crate) corpus_cost: f64,
    pub(crate) dictionary_length: f64,
    pub(crate) hypothesized_words: u64,
}

impl Lexicon {
    /// Start from one entry per distinct character of `corpus`
    ///
    /// Each letter entry is seeded with its number of occurrences, and frequencies and the
    /// dictionary length are fitted right away.
    pub fn new(corpus: Corpus) -> Result<Self> {
        let mut entries = EntryStore::default();
        let mut letters = LetterModel::default();
        let mut buf = [0; 4];
        for line in corpus.lines() {
            for c in line.chars() {
                let key = c.encode_utf8(&mut buf);
                match entries.get_mut(key) {
                    Some(entry) => entry.set_count(entry.count() + 1),
                    None => {
                        entries.insert(key, 1);
                    }
                }
                letters.observe(c);
            }
        }

        entries.refit();
        letters.refit();
        let mut lexicon = Self {
            entries,
            letters,
            corpus,
            parsed: Vec::new(),
            deleted: Vec::new(),
            blacklist: HashSet::default(),
            histories: Histories::default(),
            corpus_cost: 0.0,
            dictionary_length: 0.0,
            hypothesized_words: 0,
        };
        lexicon.dictionary_length = lexicon.compute_dictionary_length()?;
        Ok(lexicon)
    }

    /// Sum of the spelling costs of all entry keys
    ///
    /// Depends only on the current keys and the letter model, not on entry counts.
    pub fn compute_dictionary_length(&self) -> Result<f64> {
        self.entries
            .iter()
            .map(|entry| self.letters.spelling_cost(entry.key()))
            .sum()
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn letters(&self) -> &LetterModel {
        &self.letters
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Segmentation of every corpus line from the latest parse pass
    pub fn parsed(&self) -> &[Vec<String>] {
        &self.parsed
    }

    pub fn deleted(&self) -> &[Deletion] {
        &self.deleted
    }

    pub fn is_blacklisted(&self, key: &str) -> bool {
        self.blacklist.contains(key)
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    /// Bits needed to encode the corpus in the latest parse pass
    pub fn corpus_cost(&self) -> f64 {
        self.corpus_cost
    }

    /// Bits needed to spell out the lexicon, as of the latest refit
    pub fn dictionary_length(&self) -> f64 {
        self.dictionary_length
    }

    pub fn description_length(&self) -> f64 {
        self.corpus_cost + self.dictionary_length
    }

    /// Number of units in the latest parse pass
    pub fn hypothesized_words(&self) -> u64 {
        self.hypothesized_words
    }
}

/// Hypothesized breakpoints of a segmented line, starting at 0
pub fn breakpoints<S: AsRef<str>>(units: &[S]) -> Vec<usize> {
    let mut offset = 0;
    let mut out = Vec::with_capacity(units.len() + 1);
    out.push(0);
    for unit in units {
        offset += unit.as_ref().chars().count();
        out.push(offset);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_alphabet() {
        let corpus = Corpus::from_text("ab ba\naa b", 0);
        let lexicon = Lexicon::new(corpus).unwrap();
        let entries = lexicon.entries();
        assert_eq!(entries.iter().map(|e| e.key()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(entries.get("a").unwrap().count(), 4);
        assert_eq!(entries.get("b").unwrap().count(), 3);
        assert_eq!(entries.longest(), 1);
        assert!((entries.get("a").unwrap().frequency() - 4.0 / 7.0).abs() < 1e-12);

        let letters = lexicon.letters();
        let expected = -(4.0f64 / 7.0).log2() - (3.0f64 / 7.0).log2();
        assert!((lexicon.dictionary_length() - expected).abs() < 1e-12);
        assert!((letters.spelling_cost("ab").unwrap() - expected).abs() < 1e-12);
        assert!(matches!(letters.spelling_cost("abc"), Err(Error::UnknownLetter('c'))));
    }

    #[test]
    fn dictionary_length_is_stable() {
        let lexicon = Lexicon::new(Corpus::from_text("the dog saw the cat", 0)).unwrap();
        let first = lexicon.compute_dictionary_length().unwrap();
        let second = lexicon.compute_dictionary_length().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, lexicon.dictionary_length());
    }

    #[test]
    fn breakpoints_from_units() {
        assert_eq!(breakpoints(&["the", "dög"]), vec![0, 3, 6]);
        assert_eq!(breakpoints::<&str>(&[]), vec![0]);
    }
}
