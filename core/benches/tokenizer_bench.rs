use criterion::{criterion_group, criterion_main, Criterion};
use lettersearch_core::index::{Document, Segment};
use lettersearch_core::tokenizer::tokenize;
use lettersearch_core::{evaluate_fuzzy, FuzzyOptions, IndexReader};

const LETTER: &str = "Lieve Moeder, hier in Amsterdam is het weer koud. Vader schreef dat de \
    brieven uit Berlijn nog niet zijn aangekomen. Met veel liefs en tot spoedig, uw dochter.";

fn bench_tokenize(c: &mut Criterion) {
    let text = LETTER.repeat(50);
    c.bench_function("tokenize_letter", |b| b.iter(|| tokenize(&text).count()));
}

fn bench_fuzzy_scan(c: &mut Criterion) {
    let mut seg = Segment::new();
    for i in 0..500 {
        seg.upsert(Document { path: format!("/Schwartze/{i}/tekst.txt"), last_modified: 0, text: format!("{LETTER} brief{i}") });
    }
    let reader = IndexReader::from_segment(seg);
    let opts = FuzzyOptions::default();
    c.bench_function("fuzzy_scan_500_docs", |b| b.iter(|| evaluate_fuzzy("amsterdm", &reader, &opts)));
}

criterion_group!(benches, bench_tokenize, bench_fuzzy_scan);
criterion_main!(benches);
