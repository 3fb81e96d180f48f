use std::fmt;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::formats::ParsingsBlock;
use crate::HashMap;

/// How often each segmentation of a word's occurrences was seen in one iteration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    parses: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Profile {
    pub fn add(&mut self, parse: &str) {
        match self.index.get(parse) {
            Some(&i) => self.parses[i].1 += 1,
            None => {
                self.index.insert(parse.to_owned(), self.parses.len());
                self.parses.push((parse.to_owned(), 1));
            }
        }
    }

    pub fn count(&self, parse: &str) -> usize {
        self.index.get(parse).map_or(0, |&i| self.parses[i].1)
    }

    /// Distinct parses in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.parses.iter().map(|(parse, n)| (parse.as_str(), *n))
    }
}

/// Per-iteration profiles of one true word, replayed from the parsings log
#[derive(Clone, Debug, PartialEq)]
pub struct Profiles {
    word: String,
    iterations: Vec<(usize, Profile)>,
}

impl Profiles {
    /// Look up how every occurrence of `word` was segmented in each logged iteration
    ///
    /// An occurrence is rendered as the hypothesized units overlapping it, separated by
    /// spaces; units that stick out on either side are included whole.
    pub fn replay(corpus: &Corpus, blocks: &[ParsingsBlock], word: &str) -> Result<Self> {
        let occurrences = corpus
            .glossary()
            .get(word)
            .ok_or_else(|| Error::UnknownWord(word.to_owned()))?;
        let len = word.chars().count();

        let mut iterations = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut profile = Profile::default();
            for &(line, start) in &occurrences.locations {
                let missing = || Error::MissingParse {
                    iteration: block.iteration,
                    line,
                };
                let text = corpus.lines().get(line).ok_or_else(missing)?;
                let breaks = block.lines.get(line).ok_or_else(missing)?;
                let parse = covering_units(text, breaks, start, len).ok_or_else(missing)?;
                profile.add(&parse);
            }
            iterations.push((block.iteration, profile));
        }

        Ok(Self {
            word: word.to_owned(),
            iterations,
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn get(&self, iteration: usize) -> Option<&Profile> {
        self.iterations
            .iter()
            .find(|(i, _)| *i == iteration)
            .map(|(_, profile)| profile)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (usize, Profile)> {
        self.iterations.iter()
    }
}

impl fmt::Display for Profiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (iteration, profile) in &self.iterations {
            writeln!(f, "iteration:  {}", iteration)?;
            for (parse, count) in profile.iter() {
                writeln!(f, "{}:{}", parse, count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Index of the unit containing character offset `position`
pub fn unit_at(breakpoints: &[usize], position: usize) -> Option<usize> {
    match breakpoints.partition_point(|&b| b <= position) {
        0 => None,
        n if n >= breakpoints.len() => None,
        n => Some(n - 1),
    }
}

/// The units of `line` overlapping `len` characters from `start`, joined by spaces
pub fn covering_units(
    line: &str,
    breakpoints: &[usize],
    start: usize,
    len: usize,
) -> Option<String> {
    if breakpoints.windows(2).any(|w| w[0] >= w[1]) {
        return None;
    }

    let first = unit_at(breakpoints, start)?;
    let last = unit_at(breakpoints, start + len.max(1) - 1)?;
    let chars = line.chars().collect::<Vec<_>>();
    if breakpoints[last + 1] > chars.len() {
        return None;
    }

    let mut out = String::new();
    for unit in first..=last {
        if unit > first {
            out.push(' ');
        }
        out.extend(&chars[breakpoints[unit]..breakpoints[unit + 1]]);
    }
    Some(out)
}
