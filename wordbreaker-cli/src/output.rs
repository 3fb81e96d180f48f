//! Output file naming and encoded writers

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use wordbreaker::{Encoding, Histories, IterationReport, Lexicon};

use crate::config::RunConfig;

/// Every file of a run shares one prefix
#[derive(Clone, Debug)]
pub struct OutputPaths {
    prefix: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            prefix: dir.join(prefix),
        }
    }

    /// Use `prefix` as is, directory included
    pub fn from_prefix(prefix: PathBuf) -> Self {
        Self { prefix }
    }

    pub fn processed_corpus(&self) -> PathBuf {
        self.with_suffix("_processed_corpus.txt")
    }

    pub fn glossary(&self) -> PathBuf {
        self.with_suffix("_glossary.txt")
    }

    pub fn parsings(&self) -> PathBuf {
        self.with_suffix("_iterated_parsings.txt")
    }

    pub fn log(&self) -> PathBuf {
        self.with_suffix(".txt")
    }

    pub fn broken_corpus(&self) -> PathBuf {
        self.with_suffix("_final_broken_corpus.txt")
    }

    pub fn lexicon(&self) -> PathBuf {
        self.with_suffix("_lexicon.txt")
    }

    pub fn simple_lexicon(&self) -> PathBuf {
        self.with_suffix("_simple_lexicon.txt")
    }

    pub fn report(&self) -> PathBuf {
        self.with_suffix("_RecallPrecision.tsv")
    }

    pub fn summary(&self) -> PathBuf {
        self.with_suffix("_summary.json")
    }

    pub fn analysis(&self, word: &str) -> PathBuf {
        self.with_suffix(&format!("_analysis_{}.txt", word))
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = OsString::from(self.prefix.as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    }
}

/// Text file written through the configured encoding
pub struct EncodedFile {
    path: PathBuf,
    encoding: Encoding,
    writer: BufWriter<File>,
}

impl EncodedFile {
    pub fn create(path: PathBuf, encoding: Encoding) -> Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            path,
            encoding,
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        let bytes = self
            .encoding
            .encode(text)
            .with_context(|| format!("failed to encode text for {}", self.path.display()))?;
        self.writer
            .write_all(&bytes)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(self.path)
    }
}

/// Render a whole file with `render` and write it out in one go
pub fn write_file(
    path: PathBuf,
    encoding: Encoding,
    render: impl FnOnce(&mut String) -> fmt::Result,
) -> Result<PathBuf> {
    let mut text = String::new();
    render(&mut text).with_context(|| format!("failed to format {}", path.display()))?;
    let mut file = EncodedFile::create(path, encoding)?;
    file.write(&text)?;
    file.finish()
}

/// Header of the human-readable run log
pub fn write_log_header(
    out: &mut impl fmt::Write,
    config: &RunConfig,
    lexicon: &Lexicon,
) -> fmt::Result {
    let corpus = lexicon.corpus();
    writeln!(out, "corpus: {}", config.corpus.display())?;
    writeln!(out, "iterations: {}", config.iterations)?;
    writeln!(out, "lines: {}", corpus.len())?;
    writeln!(out, "candidates per iteration: {}", config.candidates_per_iteration)?;
    writeln!(out, "distinct true words: {}", corpus.glossary().len())?;
    writeln!(out, "running true words: {}", corpus.glossary().running_words())
}

/// One iteration of the run log
pub fn write_log_iteration(out: &mut impl fmt::Write, report: &IterationReport) -> fmt::Result {
    let evaluation = &report.evaluation;
    let breaks = &evaluation.breaks;
    writeln!(out)?;
    writeln!(out, "iteration {}", report.iteration)?;
    writeln!(out, "  corpus cost:        {:>14.1}", report.corpus_cost)?;
    writeln!(out, "  dictionary cost:    {:>14.1}", report.dictionary_length)?;
    writeln!(out, "  description length: {:>14.1}", report.description_length())?;
    writeln!(out, "  entries: {}", report.entries)?;
    writeln!(
        out,
        "  break precision {:.4} recall {:.4} (too big {}, too small {})",
        breaks.score.precision, breaks.score.recall, breaks.too_big, breaks.too_small
    )?;
    writeln!(
        out,
        "  token precision {:.4} recall {:.4}",
        evaluation.tokens.precision, evaluation.tokens.recall
    )?;
    writeln!(
        out,
        "  type precision {:.4} recall {:.4}",
        evaluation.types.precision, evaluation.types.recall
    )?;

    if !report.pruned.is_empty() {
        out.write_str("  pruned:")?;
        for deletion in &report.pruned {
            write!(out, " {}", deletion.key)?;
        }
        out.write_char('\n')?;
    }

    if !report.nominees.is_empty() {
        writeln!(out, "  nominees:")?;
        for nominee in &report.nominees {
            writeln!(out, "    {:<20} {:>8}", nominee.key, nominee.count)?;
        }
    }
    Ok(())
}

/// Machine-readable outcome of a run
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub corpus: &'a Path,
    pub iterations: usize,
    pub candidates_per_iteration: usize,
    pub lines: usize,
    pub true_words: usize,
    pub running_words: u64,
    pub entries: usize,
    pub deleted: usize,
    pub corpus_cost: f64,
    pub dictionary_length: f64,
    pub description_length: f64,
    pub histories: &'a Histories,
}

impl<'a> Summary<'a> {
    pub fn new(config: &'a RunConfig, lexicon: &'a Lexicon) -> Self {
        let corpus = lexicon.corpus();
        Self {
            corpus: &config.corpus,
            iterations: config.iterations,
            candidates_per_iteration: config.candidates_per_iteration,
            lines: corpus.len(),
            true_words: corpus.glossary().len(),
            running_words: corpus.glossary().running_words(),
            entries: lexicon.entries().len(),
            deleted: lexicon.deleted().len(),
            corpus_cost: lexicon.corpus_cost(),
            dictionary_length: lexicon.dictionary_length(),
            description_length: lexicon.description_length(),
            histories: lexicon.histories(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize run summary")
    }
}
