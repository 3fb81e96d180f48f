use crate::{Corpus, Induction, InductionConfig, Lexicon, Search, Segmenter};

/// Induce a lexicon from [`TEXT`]
pub fn lexicon(iterations: usize, candidates_per_iteration: usize) -> Lexicon {
    let config = InductionConfig {
        iterations,
        candidates_per_iteration,
        verbose: false,
    };
    let lexicon = Lexicon::new(corpus()).unwrap();
    Induction::new(lexicon, config).run().unwrap()
}

pub fn corpus() -> Corpus {
    Corpus::from_text(TEXT, 0)
}

/// Check that every corpus line segments back into itself
pub fn run(segmenter: &Segmenter, corpus: &Corpus) {
    let mut search = Search::default();
    for line in corpus.lines() {
        let segmentation = segmenter.segment(line, &mut search).unwrap();
        let joined = segmentation
            .units()
            .iter()
            .map(|unit| unit.as_str())
            .collect::<String>();
        assert_eq!(&joined, line);
    }
}

pub fn assert_segments(s: &[&str], search: &mut Search, segmenter: &Segmenter) {
    let segmentation = segmenter.segment(&s.join(""), search).unwrap();
    let cmp = segmentation
        .units()
        .iter()
        .map(|unit| unit.as_str())
        .collect::<Vec<_>>();
    assert_eq!(cmp, s);
}

pub fn check_segments(s: &[&str], search: &mut Search, segmenter: &Segmenter) -> bool {
    match segmenter.segment(&s.join(""), search) {
        Ok(segmentation) => segmentation.units().iter().map(|u| u.as_str()).eq(s.iter().copied()),
        Err(_) => false,
    }
}

/// Small corpus with plenty of repeated words
pub const TEXT: &str = "\
the dog saw the cat.
the cat saw the dog.
did the dog see the cat?
the cat did not see the dog.
a dog and a cat sat on the mat.
the dog sat on the mat and the cat sat on the dog.
did the cat see a dog on the mat?
the dog and the cat saw a bird.
a bird sat on the dog.
the bird did not see the cat.
the cat saw the bird on the mat.
did the bird see the dog and the cat?
the dog did not see a bird.
a cat and a dog and a bird sat on a mat.
the mat was red and the dog was brown.
the cat was black and the bird was red.
was the dog on the mat?
the bird was on the cat and the cat was on the dog.
";
