use std::cmp::Reverse;

use smartstring::alias::String;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::eval::{evaluate, Evaluation};
use crate::lexicon::{Deletion, Lexicon};
use crate::segment::{Search, Segmenter};
use crate::HashMap;

/// Knobs of an induction run
#[derive(Clone, Debug)]
pub struct InductionConfig {
    /// Number of parse passes; candidates are generated after all but the last
    pub iterations: usize,
    /// New entries admitted after each pass
    pub candidates_per_iteration: usize,
    /// Trace every step of the segmenter
    pub verbose: bool,
}

impl Default for InductionConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            candidates_per_iteration: DEFAULT_CANDIDATES,
            verbose: false,
        }
    }
}

/// Greedy lexicon growth, one parse pass per step
///
/// Each step parses the whole corpus with the current lexicon, prunes entries that went
/// unused, refits frequencies and the dictionary length, scores the parse, and (unless it is
/// the last step) admits the most frequent concatenations of adjacent units as new entries.
pub struct Induction {
    lexicon: Lexicon,
    config: InductionConfig,
    search: Search,
    next: usize,
}

impl Induction {
    pub fn new(lexicon: Lexicon, config: InductionConfig) -> Self {
        Self {
            lexicon,
            config,
            search: Search::default(),
            next: 0,
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn config(&self) -> &InductionConfig {
        &self.config
    }

    /// Run the next iteration, or return `None` once all of them have run
    pub fn step(&mut self) -> Result<Option<IterationReport>> {
        let iteration = self.next;
        if iteration >= self.config.iterations {
            return Ok(None);
        }
        self.next += 1;

        let lexicon = &mut self.lexicon;
        parse_pass_with(lexicon, iteration, self.config.verbose, &mut self.search)?;
        let pruned = prune(lexicon, iteration);
        refit(lexicon)?;

        let evaluation = evaluate(lexicon);
        if evaluation.breaks.skipped > 0 {
            warn!(
                iteration,
                skipped = evaluation.breaks.skipped,
                "lines without a true word boundary left out of the break score"
            );
        }
        let histories = &mut lexicon.histories;
        histories.dictionary_length.push(iteration, lexicon.dictionary_length);
        histories.corpus_cost.push(iteration, lexicon.corpus_cost);
        histories.break_based.push(iteration, evaluation.breaks.score);
        histories.token_based.push(iteration, evaluation.tokens);
        histories.type_based.push(iteration, evaluation.types);

        info!(
            iteration,
            corpus_cost = lexicon.corpus_cost,
            dictionary_length = lexicon.dictionary_length,
            total = lexicon.description_length(),
            entries = lexicon.entries.len(),
            pruned = pruned.len(),
            "parsed corpus"
        );
        info!(
            iteration,
            break_precision = evaluation.breaks.score.precision,
            break_recall = evaluation.breaks.score.recall,
            token_precision = evaluation.tokens.precision,
            token_recall = evaluation.tokens.recall,
            type_precision = evaluation.types.precision,
            type_recall = evaluation.types.recall,
            too_big = evaluation.breaks.too_big,
            too_small = evaluation.breaks.too_small,
            "evaluated parse"
        );

        let report = IterationReport {
            iteration,
            corpus_cost: lexicon.corpus_cost,
            dictionary_length: lexicon.dictionary_length,
            entries: lexicon.entries.len(),
            pruned,
            evaluation,
            nominees: match iteration + 1 < self.config.iterations {
                true => generate_candidates(lexicon, self.config.candidates_per_iteration),
                false => Vec::new(),
            },
        };
        Ok(Some(report))
    }

    /// Run all remaining iterations, discarding the reports
    pub fn run(mut self) -> Result<Lexicon> {
        while self.step()?.is_some() {}
        Ok(self.finish())
    }

    /// Record the counts of the last pass into the entry histories and hand back the lexicon
    pub fn finish(mut self) -> Lexicon {
        for entry in self.lexicon.entries.iter_mut() {
            entry.freeze(self.next);
        }
        self.lexicon
    }
}

/// What happened in one iteration
#[derive(Clone, Debug)]
pub struct IterationReport {
    pub iteration: usize,
    pub corpus_cost: f64,
    pub dictionary_length: f64,
    /// Lexicon size after pruning, before new candidates were added
    pub entries: usize,
    pub pruned: Vec<Deletion>,
    pub evaluation: Evaluation,
    /// Entries admitted at the end of this iteration
    pub nominees: Vec<Nominee>,
}

impl IterationReport {
    pub fn description_length(&self) -> f64 {
        self.corpus_cost + self.dictionary_length
    }
}

/// A candidate entry and the number of times its parts were adjacent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nominee {
    pub key: String,
    pub count: u64,
}

/// Parse every corpus line and recount entry usage
///
/// All counts are frozen into their histories and zeroed first. Replaces the parsed corpus,
/// the corpus cost and the number of hypothesized words.
pub fn parse_pass(lexicon: &mut Lexicon, iteration: usize, verbose: bool) -> Result<()> {
    parse_pass_with(lexicon, iteration, verbose, &mut Search::default())
}

fn parse_pass_with(
    lexicon: &mut Lexicon,
    iteration: usize,
    verbose: bool,
    search: &mut Search,
) -> Result<()> {
    lexicon.entries.reset(iteration);

    let segmenter = Segmenter::new(&lexicon.entries).verbose(verbose);
    let mut parsed = Vec::with_capacity(lexicon.corpus.len());
    let mut cost = 0.0;
    for line in lexicon.corpus.lines() {
        let segmentation = segmenter.segment(line, search)?;
        cost += segmentation.cost();
        parsed.push(segmentation.into_units());
    }

    let mut words = 0;
    for unit in parsed.iter().flatten() {
        let entry = lexicon
            .entries
            .get_mut(unit)
            .ok_or_else(|| Error::UnknownEntry(unit.to_string()))?;
        entry.set_count(entry.count() + 1);
        words += 1;
    }

    lexicon.parsed = parsed;
    lexicon.corpus_cost = cost;
    lexicon.hypothesized_words = words;
    Ok(())
}

/// Remove multi-character entries that went unused, blacklisting them for good
///
/// Single characters are never removed. Every one of them is set back to a count of 1,
/// however often the pass used it, so every line stays segmentable.
pub fn prune(lexicon: &mut Lexicon, iteration: usize) -> Vec<Deletion> {
    let removed = lexicon.entries.retain(|e| e.is_letter() || e.count() > 0);
    for entry in lexicon.entries.iter_mut().filter(|e| e.is_letter()) {
        entry.set_count(1);
    }

    let mut deletions = Vec::with_capacity(removed.len());
    for key in removed {
        debug!(iteration, key = key.as_str(), "pruned unused entry");
        lexicon.blacklist.insert(key.clone());
        let deletion = Deletion { iteration, key };
        lexicon.deleted.push(deletion.clone());
        deletions.push(deletion);
    }
    deletions
}

/// Recompute entry frequencies, the letter model and the dictionary length
pub fn refit(lexicon: &mut Lexicon) -> Result<()> {
    lexicon.entries.refit();
    lexicon.letters.refit();
    lexicon.dictionary_length = lexicon.compute_dictionary_length()?;
    Ok(())
}

/// Admit the `howmany` most frequent concatenations of adjacent units in the parsed corpus
///
/// Existing entries are not counted and blacklisted keys are passed over. Ties keep the order
/// in which candidates were first seen. Each nominee is seeded with its adjacency count, and
/// entry frequencies are refitted.
pub fn generate_candidates(lexicon: &mut Lexicon, howmany: usize) -> Vec<Nominee> {
    let mut seen = HashMap::<String, usize>::default();
    let mut candidates = Vec::<Nominee>::new();
    for units in &lexicon.parsed {
        for pair in units.windows(2) {
            let mut key = String::new();
            key.push_str(&pair[0]);
            key.push_str(&pair[1]);
            if lexicon.entries.contains(&key) {
                continue;
            }

            match seen.get(&key) {
                Some(&i) => candidates[i].count += 1,
                None => {
                    seen.insert(key.clone(), candidates.len());
                    candidates.push(Nominee { key, count: 1 });
                }
            }
        }
    }

    candidates.sort_by_key(|nominee| Reverse(nominee.count));
    let nominees = candidates
        .into_iter()
        .filter(|nominee| !lexicon.blacklist.contains(&nominee.key))
        .take(howmany)
        .collect::<Vec<_>>();

    for nominee in &nominees {
        debug!(key = nominee.key.as_str(), count = nominee.count, "admitted candidate");
        lexicon.entries.insert(&nominee.key, nominee.count);
    }
    lexicon.entries.refit();
    nominees
}

const DEFAULT_ITERATIONS: usize = 50;
const DEFAULT_CANDIDATES: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;

    fn keys(nominees: &[Nominee]) -> Vec<&str> {
        nominees.iter().map(|n| n.key.as_str()).collect()
    }

    fn parsed(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|&u| String::from(u)).collect())
            .collect()
    }

    fn lexicon(text: &str) -> Lexicon {
        Lexicon::new(Corpus::from_text(text, 0)).unwrap()
    }

    #[test]
    fn candidates_by_count_then_discovery() {
        let mut lexicon = lexicon("t he\nhe dog");
        lexicon.entries.insert("he", 2);
        lexicon.entries.insert("dog", 1);
        lexicon.parsed = parsed(&[&["t", "he"], &["he", "dog"]]);

        let nominees = generate_candidates(&mut lexicon, 1);
        assert_eq!(keys(&nominees), vec!["the"]);
        assert_eq!(lexicon.entries.get("the").unwrap().count(), 1);
        assert_eq!(lexicon.entries.longest(), 3);

        // "the" is an entry now, so only "hedog" is left
        let nominees = generate_candidates(&mut lexicon, 1);
        assert_eq!(keys(&nominees), vec!["hedog"]);
        assert_eq!(lexicon.entries.longest(), 5);
        let nominees = generate_candidates(&mut lexicon, 5);
        assert!(nominees.is_empty());
    }

    #[test]
    fn candidates_sorted_by_count() {
        let mut lexicon = lexicon("a b c");
        lexicon.parsed = parsed(&[&["a", "b", "c"], &["b", "c"], &["b", "c", "a"]]);
        let nominees = generate_candidates(&mut lexicon, 10);
        assert_eq!(keys(&nominees), vec!["bc", "ab", "ca"]);
        assert_eq!(nominees[0].count, 3);

        let total = lexicon.entries.total_count() as f64;
        let bc = lexicon.entries.get("bc").unwrap();
        assert_eq!(bc.frequency(), 3.0 / total);
    }

    #[test]
    fn pruned_entries_stay_out() {
        let mut lexicon = lexicon("ab ab\nab c");
        lexicon.entries.insert("xyz", 5);
        lexicon.entries.insert("ab", 5);
        lexicon.entries.reset(0);
        assert_eq!(
            lexicon.entries.get("xyz").unwrap().history().iter().copied().collect::<Vec<_>>(),
            vec![(0, 5)]
        );

        lexicon.entries.get_mut("ab").unwrap().set_count(3);
        let deleted = prune(&mut lexicon, 1);
        assert_eq!(
            deleted,
            vec![Deletion {
                iteration: 1,
                key: "xyz".into(),
            }]
        );
        assert!(lexicon.is_blacklisted("xyz"));
        assert_eq!(lexicon.entries.get("a").unwrap().count(), 1);

        // Nominated again with a non-zero count, still not admitted
        lexicon.parsed = parsed(&[&["x", "yz"], &["x", "yz"], &["ab", "c"]]);
        let nominees = generate_candidates(&mut lexicon, 10);
        assert_eq!(keys(&nominees), vec!["abc"]);
        assert!(!lexicon.entries.contains("xyz"));
    }

    #[test]
    fn letters_reset_to_one() {
        let mut lexicon = lexicon("a a a a b\nb a");
        parse_pass(&mut lexicon, 0, false).unwrap();
        assert_eq!(lexicon.entries.get("a").unwrap().count(), 5);
        assert_eq!(lexicon.entries.get("b").unwrap().count(), 2);

        assert!(prune(&mut lexicon, 0).is_empty());
        assert_eq!(lexicon.entries.get("a").unwrap().count(), 1);
        assert_eq!(lexicon.entries.get("b").unwrap().count(), 1);
        assert_eq!(lexicon.entries.len(), 2);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut lexicon = lexicon("the dog\nthe cat");
        parse_pass(&mut lexicon, 0, false).unwrap();
        prune(&mut lexicon, 0);
        refit(&mut lexicon).unwrap();
        generate_candidates(&mut lexicon, 3);
        parse_pass(&mut lexicon, 1, false).unwrap();

        prune(&mut lexicon, 1);
        let size = lexicon.entries.len();
        assert!(prune(&mut lexicon, 1).is_empty());
        assert_eq!(lexicon.entries.len(), size);
    }

    #[test]
    fn the_dog() {
        let mut lexicon = lexicon("the dog");
        lexicon.entries.insert("the", 50);
        lexicon.entries.insert("dog", 50);
        lexicon.entries.refit();

        parse_pass(&mut lexicon, 0, false).unwrap();
        assert_eq!(lexicon.parsed, parsed(&[&["the", "dog"]]));
        assert_eq!(lexicon.hypothesized_words(), 2);

        let evaluation = evaluate(&lexicon);
        assert_eq!(evaluation.breaks.score.precision, 1.0);
        assert_eq!(evaluation.breaks.score.recall, 1.0);
    }

    #[test]
    fn parse_pass_counts_units() {
        let mut lexicon = lexicon("ab ab");
        lexicon.entries.insert("ab", 10);
        lexicon.entries.refit();
        parse_pass(&mut lexicon, 0, true).unwrap();
        assert_eq!(lexicon.parsed, parsed(&[&["ab", "ab"]]));
        assert_eq!(lexicon.entries.get("ab").unwrap().count(), 2);
        assert_eq!(lexicon.entries.get("a").unwrap().count(), 0);

        let expected = 2.0 * -(10.0f64 / 14.0).log2();
        assert!((lexicon.corpus_cost() - expected).abs() < 1e-9);
    }

    #[test]
    fn steps() {
        let text = "the dog saw the cat\nthe cat saw the dog\nthe dog and the cat ran";
        let config = InductionConfig {
            iterations: 4,
            candidates_per_iteration: 3,
            verbose: false,
        };
        let mut induction = Induction::new(lexicon(text), config);
        let mut reports = Vec::new();
        while let Some(report) = induction.step().unwrap() {
            reports.push(report);
        }

        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].nominees.len(), 3);
        assert!(reports[..3].iter().all(|r| !r.nominees.is_empty()));
        assert!(reports[3].nominees.is_empty());

        let lexicon = induction.finish();
        let histories = lexicon.histories();
        assert_eq!(histories.corpus_cost.len(), 4);
        assert_eq!(histories.type_based.len(), 4);
        assert_eq!(lexicon.parsed().len(), lexicon.corpus().len());
        for (line, units) in lexicon.corpus().lines().iter().zip(lexicon.parsed()) {
            assert_eq!(&units.concat(), line);
        }
    }
}
