//! Unsupervised word segmentation by minimum description length
//!
//! Starting from a lexicon of single characters, an [`Induction`] repeatedly parses a
//! space-removed corpus into lexicon entries, drops entries the parse no longer uses and adds
//! the most frequent concatenations of adjacent units as new entries. Every pass is scored
//! against the true word boundaries.
//!
//! ```
//! use wordbreaker::{Corpus, Induction, InductionConfig, Lexicon};
//!
//! let corpus = Corpus::from_text("the dog saw the cat\nthe cat saw the dog", 0);
//! let config = InductionConfig {
//!     iterations: 3,
//!     candidates_per_iteration: 5,
//!     verbose: false,
//! };
//! let lexicon = Induction::new(Lexicon::new(corpus)?, config).run()?;
//! assert_eq!(lexicon.histories().corpus_cost.len(), 3);
//! # Ok::<(), wordbreaker::Error>(())
//! ```

pub mod corpus;
pub mod encoding;
pub mod entry;
pub mod error;
pub mod eval;
pub mod formats;
pub mod induction;
pub mod lexicon;
pub mod profile;
pub mod segment;
#[cfg(any(test, feature = "test-cases"))]
pub mod test_cases;

pub use corpus::{Corpus, Glossary, Occurrences};
pub use encoding::Encoding;
pub use entry::{EntryStore, LexiconEntry, Series};
pub use error::{Error, Result};
pub use eval::{evaluate, BreakScore, Evaluation, PrecisionRecall};
pub use induction::{
    generate_candidates, parse_pass, prune, refit, Induction, InductionConfig, IterationReport,
    Nominee,
};
pub use lexicon::{breakpoints, Deletion, Histories, LetterModel, Lexicon};
pub use profile::{Profile, Profiles};
pub use segment::{Search, Segmentation, Segmenter};

type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
type HashSet<T> = std::collections::HashSet<T, ahash::RandomState>;
