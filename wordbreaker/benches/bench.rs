#![cfg(feature = "test-cases")]

use bencher::{benchmark_group, benchmark_main, Bencher};

use wordbreaker::test_cases::{corpus, lexicon};
use wordbreaker::{parse_pass, Induction, InductionConfig, Lexicon, Search, Segmenter};

benchmark_group!(benches, segment_line, parse_corpus, induce);
benchmark_main!(benches);

fn segment_line(bench: &mut Bencher) {
    let lexicon = lexicon(8, 20);
    let segmenter = Segmenter::new(lexicon.entries());
    let mut search = Search::default();
    bench.iter(|| {
        let _ = segmenter.segment("thedogsatonthematandthecatsatonthedog", &mut search);
    });
}

fn parse_corpus(bench: &mut Bencher) {
    let mut lexicon = lexicon(8, 20);
    bench.iter(|| {
        let _ = parse_pass(&mut lexicon, 8, false);
    });
}

fn induce(bench: &mut Bencher) {
    bench.iter(|| {
        let lexicon = Lexicon::new(corpus()).unwrap();
        let _ = Induction::new(lexicon, InductionConfig::default()).run();
    });
}
