//! Command definitions and handlers

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use wordbreaker::formats::{self, read_corpus, read_parsings};
use wordbreaker::{Corpus, Encoding, Induction, Lexicon, Profiles};

use crate::config::{ConfigFile, RunConfig, RunSettings};
use crate::output::{self, EncodedFile, OutputPaths, Summary};

/// Unsupervised word segmentation by minimum description length
#[derive(Parser, Debug)]
#[command(name = "wordbreaker", version)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Induce a lexicon from a raw corpus and write the run's output files
    #[command(after_help = "\
Examples:
  wordbreaker run brown.txt                      50 iterations, 100 new entries each
  wordbreaker run brown.txt -n 10 -k 25 -o out   Shorter run into out/
  wordbreaker run --config run.toml              Settings from the [run] table")]
    Run(RunArgs),

    /// Show how each occurrence of a true word was segmented, iteration by iteration
    History {
        /// Output prefix of an earlier run, e.g. out/wordbreaker_brown_50_iters_100_new_per_iteration
        prefix: PathBuf,

        /// Word to follow
        word: String,

        /// Encoding of the run's files (utf8, latin1)
        #[arg(long, default_value = "utf8")]
        encoding: Encoding,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Whitespace-separated corpus, one sentence per line
    pub corpus: Option<PathBuf>,

    /// TOML file with a [run] table; flags given here override it
    #[arg(long, short = 'c', env = "WORDBREAKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the output files (default: current directory)
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Number of parse passes (default: 50)
    #[arg(long, short = 'n')]
    pub iterations: Option<usize>,

    /// New entries admitted after each pass (default: 100)
    #[arg(long = "candidates", short = 'k')]
    pub candidates_per_iteration: Option<usize>,

    /// Load at most this many corpus lines (default: 0, all of them)
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Encoding of the corpus and output files (utf8, latin1)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Trace every step of the segmenter (needs --log-level trace)
    #[arg(long)]
    pub verbose: bool,

    /// Output file prefix, replacing the one derived from the corpus name
    #[arg(long)]
    pub name: Option<String>,
}

impl RunArgs {
    fn settings(&self) -> RunSettings {
        RunSettings {
            corpus: self.corpus.clone(),
            output_dir: self.output_dir.clone(),
            iterations: self.iterations,
            candidates_per_iteration: self.candidates_per_iteration,
            max_lines: self.max_lines,
            encoding: self.encoding.clone(),
            verbose: self.verbose.then_some(true),
            name: self.name.clone(),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let file = match &args.config {
                Some(path) => ConfigFile::load(path)?.run,
                None => RunSettings::default(),
            };
            let config = RunConfig::resolve(args.settings().or(file))?;
            induce(&config).map(|_| ())
        }
        Commands::History {
            prefix,
            word,
            encoding,
        } => history(&OutputPaths::from_prefix(prefix), &word, encoding).map(|_| ()),
    }
}

/// Run the induction loop and write every output file, returning the lexicon
pub fn induce(config: &RunConfig) -> Result<Lexicon> {
    let encoding = config.encoding;
    let corpus = Corpus::read(&config.corpus, encoding, config.max_lines)
        .with_context(|| format!("failed to load corpus {}", config.corpus.display()))?;
    info!(
        corpus = %config.corpus.display(),
        lines = corpus.len(),
        words = corpus.glossary().running_words(),
        distinct = corpus.glossary().len(),
        "loaded corpus"
    );

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;
    let paths = OutputPaths::new(&config.output_dir, &config.prefix());
    output::write_file(paths.processed_corpus(), encoding, |out| {
        formats::write_processed_corpus(out, &corpus)
    })?;
    output::write_file(paths.glossary(), encoding, |out| {
        formats::write_glossary(out, corpus.glossary())
    })?;

    let lexicon = Lexicon::new(corpus).context("failed to set up the initial lexicon")?;
    let mut induction = Induction::new(lexicon, config.induction());
    let mut parsings = EncodedFile::create(paths.parsings(), encoding)?;
    let mut log = EncodedFile::create(paths.log(), encoding)?;

    let mut text = String::new();
    output::write_log_header(&mut text, config, induction.lexicon())?;
    log.write(&text)?;

    while let Some(report) = induction.step().context("induction failed")? {
        text.clear();
        formats::write_parsings(&mut text, report.iteration, induction.lexicon().parsed())?;
        parsings.write(&text)?;

        text.clear();
        output::write_log_iteration(&mut text, &report)?;
        log.write(&text)?;
    }
    parsings.finish()?;
    log.finish()?;

    let lexicon = induction.finish();
    output::write_file(paths.broken_corpus(), encoding, |out| {
        formats::write_broken_corpus(out, lexicon.parsed())
    })?;
    output::write_file(paths.lexicon(), encoding, |out| {
        formats::write_lexicon(out, &lexicon)
    })?;
    output::write_file(paths.simple_lexicon(), encoding, |out| {
        formats::write_simple_lexicon(out, &lexicon)
    })?;
    output::write_file(paths.report(), encoding, |out| {
        formats::write_report(out, lexicon.histories())
    })?;

    let summary = Summary::new(config, &lexicon).to_json()?;
    fs::write(paths.summary(), summary)
        .with_context(|| format!("failed to write {}", paths.summary().display()))?;

    info!(
        entries = lexicon.entries().len(),
        deleted = lexicon.deleted().len(),
        description_length = lexicon.description_length(),
        output = %paths.log().display(),
        "induction finished"
    );
    Ok(lexicon)
}

/// Replay the parsings log of a finished run for `word` and write the analysis file
pub fn history(paths: &OutputPaths, word: &str, encoding: Encoding) -> Result<Profiles> {
    let corpus = read_corpus(&paths.processed_corpus(), &paths.glossary(), encoding)
        .context("failed to load the processed corpus")?;
    let log = paths.parsings();
    let text = encoding.read(&log)?;
    let blocks = read_parsings(&text, &log)?;
    let profiles = Profiles::replay(&corpus, &blocks, word)?;

    let path = output::write_file(paths.analysis(word), encoding, |out| {
        use std::fmt::Write;
        write!(out, "{}", profiles)
    })?;
    info!(word, iterations = blocks.len(), output = %path.display(), "wrote word history");
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_flags() {
        let cli = Cli::try_parse_from([
            "wordbreaker",
            "run",
            "brown.txt",
            "-n",
            "10",
            "--candidates",
            "25",
            "--verbose",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        let args = match cli.command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {:?}", other),
        };
        let settings = args.settings();
        assert_eq!(settings.corpus, Some(PathBuf::from("brown.txt")));
        assert_eq!(settings.iterations, Some(10));
        assert_eq!(settings.candidates_per_iteration, Some(25));
        assert_eq!(settings.verbose, Some(true));
        assert_eq!(settings.max_lines, None);

        let quiet = RunArgs::default().settings();
        assert_eq!(quiet.verbose, None);
        assert!(Cli::try_parse_from(["wordbreaker", "history", "out/run"]).is_err());
    }

    #[test]
    fn run_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("pets.txt");
        fs::write(
            &corpus,
            "the dog saw the cat.\nthe cat saw the dog.\ndid the dog see the cat?\n",
        )
        .unwrap();

        let config = RunConfig {
            corpus,
            output_dir: dir.path().join("out"),
            iterations: 3,
            candidates_per_iteration: 4,
            max_lines: 0,
            encoding: Encoding::Utf8,
            verbose: false,
            name: None,
        };
        let lexicon = induce(&config).unwrap();
        assert_eq!(lexicon.histories().corpus_cost.len(), 3);

        let paths = OutputPaths::new(&config.output_dir, &config.prefix());
        for path in [
            paths.processed_corpus(),
            paths.glossary(),
            paths.parsings(),
            paths.log(),
            paths.broken_corpus(),
            paths.lexicon(),
            paths.simple_lexicon(),
            paths.report(),
            paths.summary(),
        ] {
            assert!(path.is_file(), "missing {}", path.display());
        }

        let report = fs::read_to_string(paths.report()).unwrap();
        assert_eq!(report.lines().count(), 2 + 3);

        let profiles = history(&paths, "dog", Encoding::Utf8).unwrap();
        assert_eq!(profiles.iter().count(), 3);
        assert_eq!(profiles.get(0).unwrap().count("d o g"), 3);
        let analysis = fs::read_to_string(paths.analysis("dog")).unwrap();
        assert!(analysis.starts_with("iteration:  0\nd o g:3\n"));

        assert!(history(&paths, "horse", Encoding::Utf8).is_err());
        let missing = OutputPaths::new(dir.path(), "nothing");
        assert!(history(&missing, "dog", Encoding::Utf8).is_err());
    }

    #[test]
    fn history_encoding() {
        let cli = Cli::try_parse_from(["wordbreaker", "history", "out/run", "dog"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History { encoding: Encoding::Utf8, .. }
        ));

        let args = ["wordbreaker", "history", "out/run", "dog", "--encoding", "ebcdic"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
