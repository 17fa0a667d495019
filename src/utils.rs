use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};

/// Default length of the CSRF nonce carried through the authorization-code flow.
pub const NONCE_LENGTH: usize = 16;

/// Generates a random alphanumeric nonce of `length` characters.
///
/// The nonce binds an authorization request to its callback; a fresh one is
/// drawn for every attempt.
///
/// # Example
///
/// ```
/// let nonce = generate_nonce(16);
/// assert_eq!(nonce.len(), 16);
/// ```
pub fn generate_nonce(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Returns a uniformly random permutation of `items`.
///
/// Fisher-Yates over a copy: walking the index from the last position down,
/// each position is swapped with one drawn uniformly from `[0, i]`. The
/// input slice is never touched, and the same seeded `rng` always yields the
/// same permutation.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.random_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Splits `items` into contiguous batches of at most `capacity` elements.
///
/// Order is preserved within and across batches; only the last batch may be
/// shorter. A zero capacity yields no batches.
pub fn chunk<T: Clone>(items: &[T], capacity: usize) -> Vec<Vec<T>> {
    if capacity == 0 {
        return Vec::new();
    }
    items.chunks(capacity).map(<[T]>::to_vec).collect()
}

/// Random suffix appended to shuffled playlist names.
///
/// Small and not checked for uniqueness: two runs on the same source may
/// produce the same name.
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.random::<u16>()
}

/// Encodes the nonce the way it is stored in the state cookie: base64 of
/// its JSON string representation.
pub fn encode_cookie_value(nonce: &str) -> String {
    STANDARD.encode(serde_json::Value::String(nonce.to_string()).to_string())
}

/// Reverses [`encode_cookie_value`]. Returns `None` for anything that is not
/// a base64-encoded JSON string.
pub fn decode_cookie_value(value: &str) -> Option<String> {
    let bytes = STANDARD.decode(value).ok()?;
    serde_json::from_slice::<String>(&bytes).ok()
}

/// Strips an optional `Bearer ` prefix from an authorization header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim_start();
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();

    if token.is_empty() { None } else { Some(token) }
}
