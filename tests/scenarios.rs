use std::fs;

use bbpe_trainer::tokenizer::{
    load_state, AddedVocabulary, BpeTrainer, ByteLevel, Error, MergeRule, MergeStrategy,
    PreTokenizer, StopReason, TieBreak,
};
use bbpe_trainer::{train, train_parallel};

const TINY_STORIES: &str = include_str!("data/tiny_stories.txt");
const EOT: &str = "<|endoftext|>";

fn b(c: char) -> u32 {
    c as u32
}

fn rules(pairs: &[(u32, u32)]) -> Vec<MergeRule> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &pair)| MergeRule {
            pair,
            new_id: 256 + i as u32,
        })
        .collect()
}

fn pre_tokenize(text: &str, specials: &[&str]) -> Vec<String> {
    let pre = ByteLevel::new(AddedVocabulary::new(specials).unwrap()).unwrap();
    let mut words = Vec::new();
    pre.for_each_word(text, |w| words.push(w.to_owned())).unwrap();
    words
}

#[test]
fn classic_example_with_smallest_bytes() {
    let output = train(["aaabdaaabac"], 259, &[]).unwrap();
    assert_eq!(
        output.merges,
        rules(&[(b('a'), b('a')), (b('a'), b('b')), (256, 257)])
    );
    assert_eq!(output.vocab.len(), 259);
    assert_eq!(output.vocab.get(256), Some(b"aa".as_slice()));
    assert_eq!(output.vocab.get(257), Some(b"ab".as_slice()));
    assert_eq!(output.vocab.get(258), Some(b"aaab".as_slice()));
    assert_eq!(output.stop_reason, StopReason::TargetReached);

    let parallel = train_parallel("aaabdaaabac", 259, &[], 3).unwrap();
    assert_eq!(parallel, output);
}

#[test]
fn classic_example_with_largest_bytes() {
    for strategy in [MergeStrategy::Baseline, MergeStrategy::Incremental] {
        let output = BpeTrainer::builder()
            .vocab_size(256 + 3 + 1)
            .special_tokens(["tok"])
            .strategy(strategy)
            .tie_break(TieBreak::LargestBytes)
            .show_progress(false)
            .build()
            .train_words(["aaabdaaabac"])
            .unwrap();

        assert_eq!(
            output.merges,
            rules(&[(b('a'), b('a')), (256, b('a')), (257, b('b'))])
        );
        assert_eq!(output.vocab.get(257), Some(b"aaa".as_slice()));
        assert_eq!(output.vocab.get(258), Some(b"aaab".as_slice()));
        assert_eq!(output.vocab.get(259), Some(b"tok".as_slice()));
    }
}

#[test]
fn single_repeated_byte_exhausts() {
    let word = "a".repeat(100);
    for strategy in [MergeStrategy::Baseline, MergeStrategy::Incremental] {
        let output = BpeTrainer::builder()
            .vocab_size(100_000)
            .strategy(strategy)
            .show_progress(false)
            .build()
            .train_words([word.as_str()])
            .unwrap();

        assert_eq!(output.stop_reason, StopReason::Exhausted);
        assert!(output.is_exhausted());
        assert_eq!(output.merges.len(), 8);
        assert_eq!(output.vocab.len(), 264);
        assert_eq!(output.vocab.get(263), Some(word.as_bytes()));
    }
}

#[test]
fn ties_are_broken_on_bytes_not_ids() {
    // After (a, a) -> 256, (256, z) and (b, z) are both seen 5 times.
    // "aa" < "b" although 256 > 98.
    let mut words = vec!["aaz"; 5];
    words.extend(vec!["bz"; 5]);
    words.extend(vec!["aa"; 10]);

    let smallest = train(words.iter().copied(), 258, &[]).unwrap();
    assert_eq!(smallest.merges, rules(&[(b('a'), b('a')), (256, b('z'))]));

    let largest = BpeTrainer::builder()
        .vocab_size(258)
        .tie_break(TieBreak::LargestBytes)
        .show_progress(false)
        .build()
        .train_words(words.iter().copied())
        .unwrap();
    assert_eq!(largest.merges, rules(&[(b('a'), b('a')), (b('b'), b('z'))]));
}

#[test]
fn ties_do_not_depend_on_word_order() {
    let mut words = vec!["xy", "yx", "xy", "yx", "pq", "qp"];
    let first = train(words.iter().copied(), 262, &[]).unwrap();
    words.reverse();
    let second = train(words.iter().copied(), 262, &[]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn special_tokens_sit_above_learned_ids() {
    let output = train_parallel("hello<|endoftext|>world", 260, &[EOT], 2).unwrap();
    assert_eq!(output.merges.len(), 3);
    assert_eq!(output.vocab.len(), 260);
    assert_eq!(output.vocab.special_ids(), 259..260);
    assert_eq!(output.vocab.get(259), Some(EOT.as_bytes()));
    assert!(
        output
            .vocab
            .iter()
            .skip(256)
            .take(3)
            .all(|(_, bytes)| !bytes.contains(&b'<'))
    );
}

#[test]
fn special_tokens_are_stripped_from_text() {
    let output = train_parallel("ab<|tok|>ab", 258, &["<|tok|>"], 2).unwrap();
    assert_eq!(output.merges, rules(&[(b('a'), b('b'))]));
    assert_eq!(output.vocab.get(256), Some(b"ab".as_slice()));
    assert_eq!(output.vocab.get(257), Some(b"<|tok|>".as_slice()));
}

#[test]
fn vocab_size_must_leave_room_for_a_merge() {
    assert!(matches!(
        train(["ab"], 256, &[]),
        Err(Error::InvalidVocabSize {
            requested: 256,
            minimum: 256
        })
    ));
    assert!(matches!(
        train(["ab"], 257, &["<s>"]),
        Err(Error::InvalidVocabSize { minimum: 257, .. })
    ));
    // Checked before the corpus is even looked at.
    assert!(matches!(
        train_parallel("", 100, &[], 4),
        Err(Error::InvalidVocabSize { .. })
    ));
    assert!(train(["ab"], 257, &[]).is_ok());
}

#[test]
fn empty_corpus_is_reported() {
    assert!(matches!(
        train(Vec::<&str>::new(), 300, &[]),
        Err(Error::EmptyCorpus)
    ));
    assert!(matches!(
        train_parallel("", 300, &[], 4),
        Err(Error::EmptyCorpus)
    ));
    assert!(matches!(
        train_parallel("<s><s><s>", 300, &["<s>"], 2),
        Err(Error::EmptyCorpus)
    ));
}

#[test]
fn zero_workers_is_rejected() {
    assert!(matches!(
        train_parallel("abc", 300, &[], 0),
        Err(Error::InvalidShardCount)
    ));
}

#[test]
fn baseline_words_match_parallel_text() {
    let vocab_size = 256 + 31 + 1;
    let words = pre_tokenize(TINY_STORIES, &[EOT]);
    let baseline = train(&words, vocab_size, &[EOT]).unwrap();

    for workers in [1, 2, 4, 8] {
        let parallel = train_parallel(TINY_STORIES, vocab_size, &[EOT], workers).unwrap();
        assert_eq!(parallel.merges, baseline.merges, "{workers} workers");
        assert_eq!(parallel.vocab, baseline.vocab, "{workers} workers");
    }
}

#[test]
fn train_from_file_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stories.txt");
    fs::write(&input, TINY_STORIES).unwrap();

    let trainer = BpeTrainer::builder()
        .vocab_size(400)
        .special_tokens([EOT])
        .workers(3)
        .show_progress(false)
        .build();
    let output = trainer.train_from_file(&input).unwrap();
    assert_eq!(output, trainer.train_text(TINY_STORIES).unwrap());

    let saved = output.save(dir.path().join("out"), "stories").unwrap();
    assert!(saved.ends_with("out/stories_tokenizer.json"));

    let (vocab, merges) = load_state(dir.path().join("out"), "stories").unwrap();
    assert_eq!(vocab, output.vocab);
    assert_eq!(merges, output.merges);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = BpeTrainer::builder()
        .show_progress(false)
        .build()
        .train_from_file(dir.path().join("nope.txt"));
    assert!(matches!(result, Err(Error::Io(_))));
}
