use std::collections::BTreeMap;
use std::path::Path;

use smartstring::alias::String;

use crate::encoding::Encoding;
use crate::error::Result;

/// Unsegmented text lines together with their true segmentation
///
/// Immutable once loaded. Breakpoints are character offsets: each line's list starts at 0 and
/// ends at the line's length in characters.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    lines: Vec<std::string::String>,
    truth: Vec<Vec<usize>>,
    glossary: Glossary,
}

impl Corpus {
    /// Load whitespace-separated text
    ///
    /// `.` and `?` become words of their own. Lines with fewer than two words are skipped, and
    /// at most `max_lines` lines are kept unless it is 0.
    pub fn from_text(text: &str, max_lines: usize) -> Self {
        let mut corpus = Self::default();
        for raw in text.lines() {
            let spaced = raw.replace('.', " .").replace('?', " ?");
            let words = spaced.split_whitespace().collect::<Vec<_>>();
            if words.len() < 2 {
                continue;
            }

            corpus.push_words(&words);
            if max_lines > 0 && corpus.len() >= max_lines {
                break;
            }
        }
        corpus
    }

    /// Read and load a raw corpus file, see [`Corpus::from_text()`]
    pub fn read(path: &Path, encoding: Encoding, max_lines: usize) -> Result<Self> {
        Ok(Self::from_text(&encoding.read(path)?, max_lines))
    }

    /// Reassemble a corpus from previously written parts
    pub fn from_parts(
        lines: Vec<std::string::String>,
        truth: Vec<Vec<usize>>,
        glossary: Glossary,
    ) -> Self {
        debug_assert_eq!(lines.len(), truth.len());
        Self {
            lines,
            truth,
            glossary,
        }
    }

    /// Append one line made of `words`
    pub fn push_words(&mut self, words: &[&str]) {
        let number = self.lines.len();
        let mut line = std::string::String::new();
        let mut offset = 0;
        let mut breakpoints = vec![0];
        for &word in words {
            self.glossary.observe(word, number, offset);
            line.push_str(word);
            offset += word.chars().count();
            breakpoints.push(offset);
        }

        self.lines.push(line);
        self.truth.push(breakpoints);
    }

    pub fn lines(&self) -> &[std::string::String] {
        &self.lines
    }

    /// True breakpoints, one list per line
    pub fn truth(&self) -> &[Vec<usize>] {
        &self.truth
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Where a true word occurs, and how often
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Occurrences {
    pub count: u64,
    /// `(line, start)` pairs, `start` being a character offset
    pub locations: Vec<(usize, usize)>,
}

/// Every true word of the corpus, in sorted order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Glossary {
    words: BTreeMap<String, Occurrences>,
    running: u64,
}

impl Glossary {
    pub fn insert(&mut self, word: &str, occurrences: Occurrences) {
        self.running += occurrences.count;
        if let Some(old) = self.words.insert(word.into(), occurrences) {
            self.running -= old.count;
        }
    }

    fn observe(&mut self, word: &str, line: usize, start: usize) {
        let entry = self.words.entry(word.into()).or_default();
        entry.count += 1;
        entry.locations.push((line, start));
        self.running += 1;
    }

    pub fn get(&self, word: &str) -> Option<&Occurrences> {
        self.words.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Occurrences)> {
        self.words.iter().map(|(word, occ)| (word.as_str(), occ))
    }

    /// Number of distinct true words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of true running words
    pub fn running_words(&self) -> u64 {
        self.running
    }
}
