#![no_main]

use libfuzzer_sys::fuzz_target;

// Differential fuzz: the mapped scan must agree with a naive
// split-and-compare over arbitrary corpus bytes and queries.
fuzz_target!(|input: (&[u8], &[u8])| {
    let (corpus, query) = input;

    let scanned = needle::corpus::mapped::contains_line(corpus, query);

    let naive = !query.is_empty()
        && !query.contains(&b'\n')
        && corpus.split(|b| *b == b'\n').any(|line| line == query);

    assert_eq!(scanned, naive);
});
