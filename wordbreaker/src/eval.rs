#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::corpus::Glossary;
use crate::entry::EntryStore;
use crate::lexicon::{breakpoints, Lexicon};

#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PrecisionRecall {
    pub precision: f64,
    pub recall: f64,
}

impl PrecisionRecall {
    /// Ratios of `hits`; an empty denominator yields 0
    pub fn from_counts(hits: u64, hypothesized: u64, truth: u64) -> Self {
        let ratio = |n: u64, d: u64| match d {
            0 => 0.0,
            _ => n as f64 / d as f64,
        };

        Self {
            precision: ratio(hits, hypothesized),
            recall: ratio(hits, truth),
        }
    }
}

/// Scores of one parse pass against the true segmentation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub breaks: BreakScore,
    pub tokens: PrecisionRecall,
    pub types: PrecisionRecall,
}

/// Break-based score, summed over all non-degenerate lines
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BreakScore {
    pub score: PrecisionRecall,
    pub hits: u64,
    pub hypothesized: u64,
    pub truth: u64,
    /// Hypothesized units spanning more than one true word
    pub too_big: u64,
    /// True words split into more than one hypothesized unit
    pub too_small: u64,
    /// Lines with fewer than two true breakpoints
    pub skipped: usize,
}

/// Score the latest parse pass of `lexicon`
pub fn evaluate(lexicon: &Lexicon) -> Evaluation {
    let glossary = lexicon.corpus().glossary();
    Evaluation {
        breaks: break_score(lexicon.corpus().truth(), lexicon.parsed()),
        tokens: token_score(lexicon.entries(), glossary, lexicon.hypothesized_words()),
        types: type_score(lexicon.entries(), glossary),
    }
}

/// Compare hypothesized against true breakpoints, line by line
///
/// Counts are summed over lines before dividing. Lines with fewer than two true breakpoints
/// are skipped.
pub fn break_score<S: AsRef<str>>(truth: &[Vec<usize>], parsed: &[Vec<S>]) -> BreakScore {
    let mut score = BreakScore::default();
    for (true_breaks, units) in truth.iter().zip(parsed) {
        if true_breaks.len() < 2 {
            score.skipped += 1;
            continue;
        }

        let hypothesis = breakpoints(units);
        let alignment = align(true_breaks, &hypothesis);
        score.hits += alignment.hits;
        score.too_big += alignment.too_big;
        score.too_small += alignment.too_small;
        score.hypothesized += hypothesis.len() as u64 - 1;
        score.truth += true_breaks.len() as u64 - 1;
    }

    score.score = PrecisionRecall::from_counts(score.hits, score.hypothesized, score.truth);
    score
}

/// For each entry that is also a true word, the smaller of its use count and true count is hit
///
/// Entry counts are read as they stand after pruning, where every letter is held at a count
/// of 1. A letter that is also a true word scores a hit even when the parse never used it, so
/// token precision can exceed 1.
pub fn token_score(entries: &EntryStore, glossary: &Glossary, hypothesized: u64) -> PrecisionRecall {
    let hits = entries
        .iter()
        .filter_map(|entry| {
            glossary
                .get(entry.key())
                .map(|occurrences| occurrences.count.min(entry.count()))
        })
        .sum();
    PrecisionRecall::from_counts(hits, hypothesized, glossary.running_words())
}

/// Distinct entries that are also true words
pub fn type_score(entries: &EntryStore, glossary: &Glossary) -> PrecisionRecall {
    let hits = entries.iter().filter(|e| glossary.contains(e.key())).count();
    PrecisionRecall::from_counts(hits as u64, entries.len() as u64, glossary.len() as u64)
}

#[derive(Debug, Default, PartialEq)]
struct Alignment {
    hits: u64,
    too_big: u64,
    too_small: u64,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Agree,
    TruthAhead,
    HypothesisAhead,
}

/// Walk two sorted breakpoint lists in lock-step, consuming the smaller position each time
///
/// Both lists start with the shared offset 0, which is not counted.
fn align(truth: &[usize], hypothesis: &[usize]) -> Alignment {
    let mut out = Alignment::default();
    let (mut t, mut h) = (truth.iter().skip(1).peekable(), hypothesis.iter().skip(1).peekable());
    let mut state = State::Agree;
    loop {
        let (next_truth, next_hyp) = match (t.peek(), h.peek()) {
            (Some(&&next_truth), Some(&&next_hyp)) => (next_truth, next_hyp),
            _ => break,
        };

        if next_truth == next_hyp {
            t.next();
            h.next();
            out.hits += 1;
            match state {
                State::TruthAhead => out.too_big += 1,
                State::HypothesisAhead => out.too_small += 1,
                State::Agree => {}
            }
            state = State::Agree;
        } else if next_truth < next_hyp {
            t.next();
            state = State::TruthAhead;
        } else {
            h.next();
            state = State::HypothesisAhead;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::induction::{parse_pass, prune};

    #[test]
    fn alignment_states() {
        let same = align(&[0, 3, 6], &[0, 3, 6]);
        assert_eq!((same.hits, same.too_big, same.too_small), (2, 0, 0));

        // "thedog" as one unit, then "s" "at" split
        let mixed = align(&[0, 3, 6, 9], &[0, 6, 7, 9]);
        assert_eq!((mixed.hits, mixed.too_big, mixed.too_small), (2, 1, 1));
    }

    #[test]
    fn perfect_breaks() {
        let truth = vec![vec![0, 3, 6], vec![0, 2, 5, 6]];
        let parsed = vec![vec!["the", "dog"], vec!["is", "not", "a"]];
        let score = break_score(&truth, &parsed);
        assert_eq!(score.score, PrecisionRecall { precision: 1.0, recall: 1.0 });
        assert_eq!(score.skipped, 0);
    }

    #[test]
    fn partial_breaks() {
        let truth = vec![vec![0, 3, 6], vec![0], vec![0, 2, 4]];
        let parsed = vec![vec!["t", "he", "dog"], vec![], vec!["isit"]];
        let score = break_score(&truth, &parsed);
        assert_eq!(score.skipped, 1);
        assert_eq!((score.hits, score.hypothesized, score.truth), (3, 4, 4));
        assert_eq!(score.score, PrecisionRecall { precision: 0.75, recall: 0.75 });
        assert!((0.0..=1.0).contains(&score.score.precision));
    }

    #[test]
    fn tokens_and_types() {
        let lexicon = Lexicon::new(Corpus::from_text("a b a\nb c", 0)).unwrap();
        // Letter entries: a 2, b 2, c 1, all of them true words
        let glossary = lexicon.corpus().glossary();
        let tokens = token_score(lexicon.entries(), glossary, 10);
        assert_eq!(tokens, PrecisionRecall::from_counts(5, 10, 5));

        let types = type_score(lexicon.entries(), glossary);
        assert_eq!(types, PrecisionRecall { precision: 1.0, recall: 1.0 });
        assert_eq!(PrecisionRecall::from_counts(1, 0, 0), PrecisionRecall::default());
    }

    #[test]
    fn unused_letters_still_hit() {
        let mut lexicon = Lexicon::new(Corpus::from_text("a b ab\nab ab", 0)).unwrap();
        lexicon.entries.insert("ab", 100);
        lexicon.entries.refit();
        parse_pass(&mut lexicon, 0, false).unwrap();
        assert!(lexicon.parsed().iter().flatten().all(|unit| unit == "ab"));
        assert_eq!(lexicon.hypothesized_words(), 4);

        prune(&mut lexicon, 0);
        let glossary = lexicon.corpus().glossary();
        let tokens = token_score(lexicon.entries(), glossary, lexicon.hypothesized_words());
        // a 1, b 1, ab 3 of 4 hypothesized units
        assert_eq!(tokens, PrecisionRecall::from_counts(5, 4, 5));
        assert!(tokens.precision > 1.0);
    }
}
