use rand::{SeedableRng, rngs::StdRng};
use spotshuffle::utils::*;

fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}

#[test]
fn test_generate_nonce() {
    let nonce = generate_nonce(NONCE_LENGTH);
    assert_eq!(nonce.len(), 16);
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));

    // each call draws a new nonce
    assert_ne!(generate_nonce(NONCE_LENGTH), generate_nonce(NONCE_LENGTH));
    assert_eq!(generate_nonce(0), "");
}

#[test]
fn test_shuffle_keeps_every_element() {
    let items: Vec<u32> = (0..200).collect();
    let mut rng = StdRng::seed_from_u64(7);

    let shuffled = shuffle(&items, &mut rng);

    assert_eq!(shuffled.len(), items.len());
    assert_eq!(sorted(&shuffled), items);
}

#[test]
fn test_shuffle_keeps_duplicates() {
    let items = vec!["a", "b", "a", "c", "a"];
    let mut rng = StdRng::seed_from_u64(1);

    let shuffled = shuffle(&items, &mut rng);

    assert_eq!(sorted(&shuffled), sorted(&items));
}

#[test]
fn test_shuffle_leaves_input_untouched() {
    let items = vec![1, 2, 3, 4, 5];
    let mut rng = StdRng::seed_from_u64(3);

    let _ = shuffle(&items, &mut rng);

    assert_eq!(items, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_shuffle_is_deterministic_for_a_seed() {
    let items: Vec<u32> = (0..50).collect();

    let first = shuffle(&items, &mut StdRng::seed_from_u64(42));
    let second = shuffle(&items, &mut StdRng::seed_from_u64(42));

    assert_eq!(first, second);
}

#[test]
fn test_shuffle_edge_cases() {
    let mut rng = StdRng::seed_from_u64(0);

    let empty: Vec<u8> = Vec::new();
    assert!(shuffle(&empty, &mut rng).is_empty());
    assert_eq!(shuffle(&["only"], &mut rng), vec!["only"]);
}

#[test]
fn test_shuffle_reaches_every_permutation() {
    let items = [1, 2, 3];
    let mut rng = StdRng::seed_from_u64(11);
    let mut seen = std::collections::BTreeSet::new();

    for _ in 0..600 {
        seen.insert(shuffle(&items, &mut rng));
    }

    assert_eq!(seen.len(), 6);
}

#[test]
fn test_chunk_by_capacity() {
    let items: Vec<u32> = (0..200).collect();

    let batches = chunk(&items, 90);

    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![90, 90, 20]);
    assert_eq!(batches.concat(), items);
}

#[test]
fn test_chunk_edge_cases() {
    let items: Vec<u32> = (0..90).collect();
    assert_eq!(chunk(&items, 90).len(), 1);

    let empty: Vec<u32> = Vec::new();
    assert!(chunk(&empty, 90).is_empty());

    assert!(chunk(&items, 0).is_empty());
}

#[test]
fn test_cookie_value_encoding() {
    let encoded = encode_cookie_value("abc123");

    // base64 of the JSON string "abc123", quotes included
    assert_eq!(encoded, "ImFiYzEyMyI=");
    assert_eq!(decode_cookie_value(&encoded), Some("abc123".to_string()));
}

#[test]
fn test_cookie_value_rejects_garbage() {
    assert_eq!(decode_cookie_value("not base64!"), None);
    // valid base64 of a bare word, which is not a JSON string
    assert_eq!(decode_cookie_value("YWJj"), None);
}

#[test]
fn test_bearer_token() {
    assert_eq!(bearer_token("Bearer abc"), Some("abc"));
    assert_eq!(bearer_token("bearer abc"), Some("abc"));
    assert_eq!(bearer_token("abc"), Some("abc"));
    assert_eq!(bearer_token("Bearer "), None);
    assert_eq!(bearer_token("   "), None);
}

#[test]
fn test_random_suffix_is_seeded() {
    let a = random_suffix(&mut StdRng::seed_from_u64(5));
    let b = random_suffix(&mut StdRng::seed_from_u64(5));
    assert_eq!(a, b);
}
