use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::{tempdir, TempDir};
use wordvec::codec::{write_binary, write_text};
use wordvec::vector::magnitude;
use wordvec::{
    ByteDecoder, Error, Handler, LoadConfig, Response, Snapshot, TrainConfig, VectorMatrix,
    VectorRows, WordVectors,
};

const WORDS: [&str; 5] = ["king", "queen", "man", "woman", "apple"];

fn fixture_rows() -> Vec<Vec<f32>> {
    vec![
        vec![0.9, 0.9, 0.0, 0.1],
        vec![0.9, 0.0, 0.9, 0.1],
        vec![0.1, 0.9, 0.0, 0.2],
        vec![0.1, 0.0, 0.9, 0.2],
        vec![0.0, 0.1, 0.1, 0.9],
    ]
}

fn vocab() -> Vec<String> {
    WORDS.iter().map(|w| w.to_string()).collect()
}

fn write_model(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    let vectors = VectorMatrix::from_rows(4, &fixture_rows()).unwrap();
    let mut out = BufWriter::new(File::create(&path).unwrap());
    write_binary(&mut out, &vocab(), &vectors, &ByteDecoder::latin1()).unwrap();
    drop(out);
    path
}

fn write_neg_side_model(base: &Path) {
    let mut syn1 = String::from("layer1_size 4 window 2 cbow 0 hs 0 neg 2\n");
    for (i, word) in WORDS.iter().enumerate() {
        let x = i as f32 * 0.1;
        syn1.push_str(&format!("{} {} {} {} {}\n", word, x, -x, 0.05, 0.2 - x));
    }
    fs::write(format!("{}.syn1", base.display()), syn1).unwrap();
}

fn write_hs_side_model(base: &Path) {
    let syn1 = "layer1_size 4 window 2 cbow 1 hs 1 neg 0\n\
                0 0.1 0.2 -0.1 0.0\n\
                1 -0.2 0.1 0.3 0.1\n\
                2 0.05 -0.05 0.1 0.2\n";
    fs::write(format!("{}.syn1", base.display()), syn1).unwrap();

    let vocab = "king 2 0 1 0 1\n\
                 queen 2 0 1 1 0\n\
                 man 2 0 2 0 1\n\
                 woman 2 0 2 1 1\n\
                 apple 1 0 0\n";
    fs::write(format!("{}.vocab", base.display()), vocab).unwrap();
}

#[test]
fn test_load_and_query_binary_model() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");

    let store = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    assert_eq!(store.len(), 5);
    assert_eq!(store.dim(), 4);
    assert!(store.side_model().is_none());

    for i in 0..store.len() {
        let norm = magnitude(store.vectors().row(i));
        assert!((norm - 1.0).abs() < 1e-5, "row {} has norm {}", i, norm);
    }

    let neighbors = store.cosine("king", 3).unwrap();
    assert_eq!(neighbors.len(), 3);
    assert!(neighbors.iter().all(|(i, _)| *i != store.ix("king").unwrap()));
    assert!(neighbors.windows(2).all(|w| w[0].1 >= w[1].1));

    let matches = store.analogy(&["king", "woman"], &["man"], 2).unwrap();
    let response = store.generate_response(&matches, true).unwrap();
    assert_eq!(response[0].word, "queen");
    assert_eq!(response.len(), 2);
    assert!(response.iter().all(|n| n.cluster.is_none()));
}

#[test]
fn test_cosine_scores_match_dot_products() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    let store = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let word = WORDS[rng.gen_range(0..WORDS.len())];
        let n = rng.gen_range(0..=6);
        let result = store.cosine(word, n).unwrap();

        assert_eq!(result.len(), n.min(store.len() - 1));
        let query = store.get_vector(word).unwrap();
        for (index, score) in &result {
            let expected: f32 = query
                .iter()
                .zip(store.vectors().row(*index))
                .map(|(a, b)| a * b)
                .sum();
            assert!((expected - score).abs() < 1e-5);
        }
    }
}

#[test]
fn test_desired_vocab_and_text_format() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");

    let config = LoadConfig::default().with_desired_vocab(["queen", "apple"]);
    let store = WordVectors::from_binary_file(&path, &config).unwrap();
    assert_eq!(store.vocab(), &["queen".to_string(), "apple".to_string()]);
    assert!(matches!(store.ix("king"), Err(Error::KeyNotFound(_))));

    let full = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    let text_path = dir.path().join("model.txt");
    let mut out = BufWriter::new(File::create(&text_path).unwrap());
    write_text(&mut out, full.vocab(), full.vectors(), &ByteDecoder::latin1()).unwrap();
    drop(out);

    let text = WordVectors::from_text_file(&text_path, &LoadConfig::default()).unwrap();
    assert_eq!(text.vocab(), full.vocab());
    let from_text: Vec<usize> = text.cosine("woman", 4).unwrap().iter().map(|m| m.0).collect();
    let from_binary: Vec<usize> = full.cosine("woman", 4).unwrap().iter().map(|m| m.0).collect();
    assert_eq!(from_text, from_binary);
}

#[test]
fn test_snapshot_restores_identical_store() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    let clusters_path = dir.path().join("classes.txt");
    fs::write(&clusters_path, "king 0\nqueen 0\nman 1\nwoman 1\napple 2\n").unwrap();

    let config = LoadConfig::default().with_clusters(&clusters_path);
    let store = WordVectors::from_binary_file(&path, &config).unwrap();
    assert_eq!(store.clusters(), Some(&[0, 0, 1, 1, 2][..]));

    let snap_path = dir.path().join("model.wvsn");
    let snapshot = Snapshot::default();
    snapshot.save(&store, &snap_path).unwrap();

    let eager = snapshot.load(&snap_path).unwrap();
    let mapped = snapshot.open_mapped(&snap_path).unwrap();
    assert_eq!(eager.vectors(), store.vectors());
    assert_eq!(mapped.clusters(), store.clusters());

    let expected = store.analogy(&["king", "woman"], &["man"], 3).unwrap();
    assert_eq!(eager.analogy(&["king", "woman"], &["man"], 3).unwrap(), expected);
    assert_eq!(mapped.analogy(&["king", "woman"], &["man"], 3).unwrap(), expected);

    let response = mapped.generate_response(&expected, true).unwrap();
    assert_eq!(response[0].word, "queen");
    assert_eq!(response[0].cluster, Some(0));

    // No side files next to the snapshot
    assert!(mapped.side_model().is_none());
    let result = mapped.train_sentence("king queen", &TrainConfig::default());
    assert!(matches!(result, Err(Error::ModelMissing)));
}

#[test]
fn test_train_with_negative_sampling() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    write_neg_side_model(&path);

    let store = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    let model = store.side_model().unwrap();
    assert!(!model.hs);
    assert_eq!(model.syn1_size, 5);

    let config = TrainConfig::default().with_epochs(10).with_seed(42);
    let first = store.train_sentence("king woman apple", &config).unwrap();
    let second = store.train_sentence("king woman apple", &config).unwrap();
    assert_eq!(first.len(), 4);
    assert!(first.iter().all(|x| x.is_finite()));
    assert_eq!(first, second);

    assert!(matches!(
        store.train_sentence("king prince", &config),
        Err(Error::KeyNotFound(_))
    ));
    assert!(matches!(
        store.train_sentence("   ", &config),
        Err(Error::InvalidQuery(_))
    ));

    // The snapshot picks up the side model saved next to it
    let snap_path = dir.path().join("model.wvsn");
    Snapshot::default().save(&store, &snap_path).unwrap();
    write_neg_side_model(&snap_path);
    let mapped = Snapshot::default().open_mapped(&snap_path).unwrap();
    assert_eq!(mapped.train_sentence("king woman apple", &config).unwrap(), first);
}

#[test]
fn test_train_with_hierarchical_softmax() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    write_hs_side_model(&path);

    let store = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    let model = store.side_model().unwrap();
    assert!(model.hs && model.cbow);
    assert_eq!(model.huffman_code("apple").unwrap().codelen(), 1);

    let config = TrainConfig::default().with_epochs(5).with_seed(3);
    let vector = store.train_sentence("queen man woman", &config).unwrap();
    assert_eq!(vector.len(), 4);
    assert!(vector.iter().all(|x| x.is_finite()));

    // Stored rows are untouched by training
    let reloaded = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    assert_eq!(reloaded.vectors(), store.vectors());
}

#[test]
fn test_missing_huffman_vocab_is_format_error() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    write_hs_side_model(&path);
    fs::remove_file(format!("{}.vocab", path.display())).unwrap();

    let result = WordVectors::from_binary_file(&path, &LoadConfig::default());
    assert!(matches!(result, Err(Error::Format(_))));

    let store =
        WordVectors::from_binary_file(&path, &LoadConfig::default().with_side_model(false)).unwrap();
    assert!(store.side_model().is_none());
}

#[test]
fn test_malformed_files_are_format_errors() {
    let dir = tempdir().unwrap();

    let bad_header = dir.path().join("bad_header.bin");
    fs::write(&bad_header, b"5\n").unwrap();
    assert!(matches!(
        WordVectors::from_binary_file(&bad_header, &LoadConfig::default()),
        Err(Error::Format(_))
    ));

    let truncated = dir.path().join("truncated.bin");
    let mut bytes = fs::read(write_model(&dir, "model.bin")).unwrap();
    bytes.truncate(bytes.len() - 6);
    fs::write(&truncated, bytes).unwrap();
    assert!(matches!(
        WordVectors::from_binary_file(&truncated, &LoadConfig::default()),
        Err(Error::Format(_))
    ));

    let short_text = dir.path().join("short.txt");
    fs::write(&short_text, "2 3\nking 1 2 3\nqueen 1 2\n").unwrap();
    assert!(matches!(
        WordVectors::from_text_file(&short_text, &LoadConfig::default()),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_query_handler_over_mapped_snapshot() {
    let dir = tempdir().unwrap();
    let path = write_model(&dir, "model.bin");
    let store = WordVectors::from_binary_file(&path, &LoadConfig::default()).unwrap();
    let snap_path = dir.path().join("model.wvsn");
    Snapshot::default().save(&store, &snap_path).unwrap();

    let handler = Handler::new(Snapshot::default().open_mapped(&snap_path).unwrap());
    match handler.handle_line("ANALOGY king woman -man 1") {
        Response::Neighbors(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].word, "queen");
        }
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(handler.handle_line("HAS apple"), Response::Integer(1));
    assert!(handler.handle_line("TRAIN :: king").is_error());
}
