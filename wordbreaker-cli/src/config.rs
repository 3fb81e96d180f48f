//! Run settings, from an optional TOML file overridden by command-line flags

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;
use wordbreaker::{Encoding, InductionConfig};

/// Contents of a `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub run: RunSettings,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!("Loaded run config from {}", path.display());
        Ok(config)
    }
}

/// Settings of the `[run]` table; every field is optional so flags can be layered on top
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    #[serde(default)]
    pub corpus: Option<PathBuf>,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub iterations: Option<usize>,

    #[serde(default)]
    pub candidates_per_iteration: Option<usize>,

    /// 0 loads every line
    #[serde(default)]
    pub max_lines: Option<usize>,

    /// `utf8` or `latin1`
    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(default)]
    pub verbose: Option<bool>,

    /// Overrides the generated output file prefix
    #[serde(default)]
    pub name: Option<String>,
}

impl RunSettings {
    /// Fill the settings missing here from `fallback`
    pub fn or(self, fallback: Self) -> Self {
        Self {
            corpus: self.corpus.or(fallback.corpus),
            output_dir: self.output_dir.or(fallback.output_dir),
            iterations: self.iterations.or(fallback.iterations),
            candidates_per_iteration: self
                .candidates_per_iteration
                .or(fallback.candidates_per_iteration),
            max_lines: self.max_lines.or(fallback.max_lines),
            encoding: self.encoding.or(fallback.encoding),
            verbose: self.verbose.or(fallback.verbose),
            name: self.name.or(fallback.name),
        }
    }
}

/// Fully resolved settings of an induction run
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub corpus: PathBuf,
    pub output_dir: PathBuf,
    pub iterations: usize,
    pub candidates_per_iteration: usize,
    pub max_lines: usize,
    pub encoding: Encoding,
    pub verbose: bool,
    pub name: Option<String>,
}

impl RunConfig {
    /// Apply defaults and validate
    pub fn resolve(settings: RunSettings) -> Result<Self> {
        let defaults = InductionConfig::default();
        let corpus = match settings.corpus {
            Some(corpus) => corpus,
            None => bail!("no corpus given, pass one on the command line or set run.corpus"),
        };
        if !corpus.is_file() {
            bail!("corpus file {} does not exist", corpus.display());
        }

        let iterations = settings.iterations.unwrap_or(defaults.iterations);
        if iterations == 0 {
            bail!("iterations must be at least 1");
        }

        let encoding = match settings.encoding {
            Some(name) => name.parse::<Encoding>()?,
            None => Encoding::default(),
        };

        Ok(Self {
            corpus,
            output_dir: settings.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            iterations,
            candidates_per_iteration: settings
                .candidates_per_iteration
                .unwrap_or(defaults.candidates_per_iteration),
            max_lines: settings.max_lines.unwrap_or(0),
            encoding,
            verbose: settings.verbose.unwrap_or(defaults.verbose),
            name: settings.name,
        })
    }

    pub fn induction(&self) -> InductionConfig {
        InductionConfig {
            iterations: self.iterations,
            candidates_per_iteration: self.candidates_per_iteration,
            verbose: self.verbose,
        }
    }

    /// Output file prefix: the configured name, or one derived from the corpus and settings
    pub fn prefix(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let stem = self
                    .corpus
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "corpus".to_owned());
                format!(
                    "wordbreaker_{}_{}_iters_{}_new_per_iteration",
                    stem, self.iterations, self.candidates_per_iteration
                )
            }
        }
    }
}
