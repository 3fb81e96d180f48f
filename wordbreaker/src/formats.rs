//! Text formats shared by the induction run and the history replay
//!
//! Writers render into any [`fmt::Write`] sink so the caller decides on the file encoding.
//! Readers take the decoded file contents plus the path, which is only used in error messages.

use std::fmt::{self, Write};
use std::path::Path;

use crate::corpus::{Corpus, Glossary, Occurrences};
use crate::encoding::Encoding;
use crate::entry::LexiconEntry;
use crate::error::{Error, Result};
use crate::lexicon::{breakpoints, Histories, Lexicon};

/// Marker line opening each iteration block of the parsings log
pub const ITERATION_MARKER: &str = "#current_iteration#";

/// One `<line>:<text>` line followed by its true breakpoints, for every corpus line
pub fn write_processed_corpus(out: &mut impl Write, corpus: &Corpus) -> fmt::Result {
    for (number, (line, truth)) in corpus.lines().iter().zip(corpus.truth()).enumerate() {
        writeln!(out, "{}:{}", number, line)?;
        write_numbers(out, truth)?;
        out.write_char('\n')?;
    }
    Ok(())
}

/// For every true word, `<word> <count>` and then its `<line>:<start>` locations
pub fn write_glossary(out: &mut impl Write, glossary: &Glossary) -> fmt::Result {
    for (word, occurrences) in glossary.iter() {
        writeln!(out, "{} {}", word, occurrences.count)?;
        for (line, start) in &occurrences.locations {
            write!(out, "{}:{} ", line, start)?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// One block of the parsings log: the hypothesized breakpoints of every line
pub fn write_parsings<S: AsRef<str>>(
    out: &mut impl Write,
    iteration: usize,
    parsed: &[Vec<S>],
) -> fmt::Result {
    writeln!(out, "{} {}", ITERATION_MARKER, iteration)?;
    for (number, units) in parsed.iter().enumerate() {
        write!(out, "{}:", number)?;
        write_numbers(out, &breakpoints(units))?;
        out.write_char('\n')?;
    }
    Ok(())
}

/// The parsed corpus, units separated by spaces
pub fn write_broken_corpus<S: AsRef<str>>(out: &mut impl Write, parsed: &[Vec<S>]) -> fmt::Result {
    for units in parsed {
        for (i, unit) in units.iter().enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            out.write_str(unit.as_ref())?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// Entries in key order with their count histories, then the pruned entries
pub fn write_lexicon(out: &mut impl Write, lexicon: &Lexicon) -> fmt::Result {
    for entry in sorted_entries(lexicon) {
        writeln!(out, "{:<20}", entry.key())?;
        for (iteration, count) in entry.history() {
            writeln!(out, "{:>6} {:>10}", iteration, thousands(*count))?;
        }
    }
    for deletion in lexicon.deleted() {
        writeln!(out, "{} {}", deletion.iteration, deletion.key)?;
    }
    Ok(())
}

/// Entry keys in order, one per line
pub fn write_simple_lexicon(out: &mut impl Write, lexicon: &Lexicon) -> fmt::Result {
    for entry in sorted_entries(lexicon) {
        writeln!(out, "{}", entry.key())?;
    }
    Ok(())
}

/// Costs and scores of every iteration, tab-separated
pub fn write_report(out: &mut impl Write, histories: &Histories) -> fmt::Result {
    writeln!(out, "\t\t\tBreak\t\tToken-based\t\tType-based")?;
    writeln!(out, "\t\t\tprecision\trecall\tprecision\trecall\tprecision\trecall")?;
    let rows = histories
        .dictionary_length
        .iter()
        .zip(&histories.corpus_cost)
        .zip(&histories.break_based)
        .zip(&histories.token_based)
        .zip(&histories.type_based);
    for ((((&(iteration, dictionary), (_, corpus)), (_, breaks)), (_, tokens)), (_, types)) in rows {
        writeln!(
            out,
            "{}\t{:.0}\t{:.0}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}",
            iteration,
            dictionary.trunc(),
            corpus.trunc(),
            breaks.precision,
            breaks.recall,
            tokens.precision,
            tokens.recall,
            types.precision,
            types.recall,
        )?;
    }
    Ok(())
}

/// Load a corpus back from its processed corpus and glossary files
pub fn read_corpus(processed: &Path, glossary: &Path, encoding: Encoding) -> Result<Corpus> {
    let (lines, truth) = read_processed_corpus(&encoding.read(processed)?, processed)?;
    let glossary = read_glossary(&encoding.read(glossary)?, glossary)?;
    Ok(Corpus::from_parts(lines, truth, glossary))
}

/// Parse the output of [`write_processed_corpus()`]
pub fn read_processed_corpus(text: &str, path: &Path) -> Result<(Vec<String>, Vec<Vec<usize>>)> {
    let mut lines = Vec::new();
    let mut truth = Vec::new();
    let mut iter = text.lines().enumerate().filter(|(_, ln)| !ln.trim().is_empty());
    while let Some((i, ln)) = iter.next() {
        let (number, line) = ln
            .split_once(':')
            .ok_or_else(|| Error::format(path, i + 1, "expected `<line>:<text>`"))?;
        if parse_number(number, path, i)? != lines.len() {
            return Err(Error::format(path, i + 1, format!("expected line {}", lines.len())));
        }

        let (j, numbers) = iter
            .next()
            .ok_or_else(|| Error::format(path, i + 2, "missing breakpoints"))?;
        let breaks = parse_breakpoints(numbers, path, j)?;
        if breaks.last() != Some(&line.chars().count()) {
            return Err(Error::format(path, j + 1, "breakpoints do not span the line"));
        }

        lines.push(line.to_owned());
        truth.push(breaks);
    }
    Ok((lines, truth))
}

/// Parse the output of [`write_glossary()`]
pub fn read_glossary(text: &str, path: &Path) -> Result<Glossary> {
    let mut glossary = Glossary::default();
    let mut iter = text.lines().enumerate().filter(|(_, ln)| !ln.trim().is_empty());
    while let Some((i, ln)) = iter.next() {
        let (word, count) = ln
            .rsplit_once(' ')
            .ok_or_else(|| Error::format(path, i + 1, "expected `<word> <count>`"))?;
        let count = parse_number(count, path, i)? as u64;

        let (j, locations) = iter
            .next()
            .ok_or_else(|| Error::format(path, i + 2, "missing locations"))?;
        let locations = locations
            .split_whitespace()
            .map(|token| {
                let (line, start) = token
                    .split_once(':')
                    .ok_or_else(|| Error::format(path, j + 1, "expected `<line>:<start>`"))?;
                Ok((parse_number(line, path, j)?, parse_number(start, path, j)?))
            })
            .collect::<Result<Vec<_>>>()?;

        glossary.insert(word, Occurrences { count, locations });
    }
    Ok(glossary)
}

/// Hypothesized breakpoints of every line in one iteration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsingsBlock {
    pub iteration: usize,
    pub lines: Vec<Vec<usize>>,
}

/// Parse a log made of [`write_parsings()`] blocks
pub fn read_parsings(text: &str, path: &Path) -> Result<Vec<ParsingsBlock>> {
    let mut blocks = Vec::<ParsingsBlock>::new();
    for (i, ln) in text.lines().enumerate() {
        let ln = ln.trim();
        if ln.is_empty() {
            continue;
        }

        if let Some(rest) = ln.strip_prefix(ITERATION_MARKER) {
            blocks.push(ParsingsBlock {
                iteration: parse_number(rest, path, i)?,
                lines: Vec::new(),
            });
            continue;
        }

        let block = blocks
            .last_mut()
            .ok_or_else(|| Error::format(path, i + 1, "parse outside of an iteration block"))?;
        let (number, breaks) = ln
            .split_once(':')
            .ok_or_else(|| Error::format(path, i + 1, "expected `<line>:<breakpoints>`"))?;
        if parse_number(number, path, i)? != block.lines.len() {
            let msg = format!("expected line {}", block.lines.len());
            return Err(Error::format(path, i + 1, msg));
        }
        block.lines.push(parse_breakpoints(breaks, path, i)?);
    }
    Ok(blocks)
}

fn sorted_entries(lexicon: &Lexicon) -> Vec<&LexiconEntry> {
    let mut entries = lexicon.entries().iter().collect::<Vec<_>>();
    entries.sort_by(|a, b| a.key().cmp(b.key()));
    entries
}

fn write_numbers(out: &mut impl Write, numbers: &[usize]) -> fmt::Result {
    for (i, n) in numbers.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        write!(out, "{}", n)?;
    }
    Ok(())
}

/// `i` is the zero-based line index within `path`
fn parse_number(s: &str, path: &Path, i: usize) -> Result<usize> {
    s.trim()
        .parse()
        .map_err(|e| Error::format(path, i + 1, format!("invalid number {:?}: {}", s.trim(), e)))
}

fn parse_numbers(s: &str, path: &Path, i: usize) -> Result<Vec<usize>> {
    s.split_whitespace().map(|n| parse_number(n, path, i)).collect()
}

/// Breakpoints must start at 0 and be strictly increasing
fn parse_breakpoints(s: &str, path: &Path, i: usize) -> Result<Vec<usize>> {
    let breaks = parse_numbers(s, path, i)?;
    if breaks.first() != Some(&0) || breaks.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::format(path, i + 1, "breakpoints out of order"));
    }
    Ok(breaks)
}

/// Format `n` with `,` between groups of three digits
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("test.txt")
    }

    #[test]
    fn processed_corpus() {
        let corpus = Corpus::from_text("the dog\nsaw the cat", 0);
        let mut out = String::new();
        write_processed_corpus(&mut out, &corpus).unwrap();
        assert_eq!(out, "0:thedog\n0 3 6\n1:sawthecat\n0 3 6 9\n");

        let (lines, truth) = read_processed_corpus(&out, path()).unwrap();
        assert_eq!(lines, corpus.lines());
        assert_eq!(truth, corpus.truth());

        let bad = "0:thedog\n0 3 7\n";
        assert!(matches!(
            read_processed_corpus(bad, path()),
            Err(Error::Format { line: 2, .. })
        ));
    }

    #[test]
    fn breakpoints_out_of_order() {
        let corpus = "0:sawthecat\n0 3 9 5 10\n";
        assert!(matches!(
            read_processed_corpus(corpus, path()),
            Err(Error::Format { line: 2, .. })
        ));
        let corpus = "0:thedog\n3 6\n";
        assert!(read_processed_corpus(corpus, path()).is_err());

        let log = "#current_iteration# 0\n0:0 9 4 10\n1:0 7 9 13\n";
        match read_parsings(log, path()) {
            Err(Error::Format { line, message, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(message, "breakpoints out of order");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(read_parsings("#current_iteration# 0\n0:0 3 3 6\n", path()).is_err());
        assert!(read_parsings("#current_iteration# 0\n0:1 3\n", path()).is_err());
    }

    #[test]
    fn glossary() {
        let corpus = Corpus::from_text("the dog\nsaw the cat", 0);
        let mut out = String::new();
        write_glossary(&mut out, corpus.glossary()).unwrap();
        assert!(out.starts_with("cat 1\n1:6 \ndog 1\n0:3 \n"));
        assert!(out.ends_with("the 2\n0:0 1:3 \n"));
        assert_eq!(&read_glossary(&out, path()).unwrap(), corpus.glossary());
    }

    #[test]
    fn parsings() {
        let mut out = String::new();
        write_parsings(&mut out, 0, &[vec!["t", "he"], vec!["dog"]]).unwrap();
        write_parsings(&mut out, 1, &[vec!["the"], vec!["do", "g"]]).unwrap();
        assert!(out.starts_with("#current_iteration# 0\n0:0 1 3\n1:0 3\n"));

        let blocks = read_parsings(&out, path()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].iteration, 1);
        assert_eq!(blocks[1].lines, vec![vec![0, 3], vec![0, 2, 3]]);

        assert!(read_parsings("0:0 3\n", path()).is_err());
        assert!(read_parsings("#current_iteration# 0\n1:0 3\n", path()).is_err());
    }

    #[test]
    fn broken_corpus() {
        let mut out = String::new();
        write_broken_corpus(&mut out, &[vec!["the", "dog"], vec!["x"]]).unwrap();
        assert_eq!(out, "the dog\nx\n");
    }

    #[test]
    fn digit_groups() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
