//! Query string handling for Shopify app proxy requests.
//!
//! The app proxy signs the *decoded* query parameters, so everything here works from the raw query string exactly as
//! it was received. Values are decoded once and never re-encoded before hashing.
use std::collections::BTreeMap;

pub const SIGNATURE_PARAM: &str = "signature";

/// The ordered `(key, value)` pairs of a raw query string, both still percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameterSet {
    pairs: Vec<(String, String)>,
}

/// The exact byte sequence that the app proxy signature is calculated over.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureCandidate(String);

impl SignatureCandidate {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// The candidate contains customer data, so keep it out of debug logs.
impl std::fmt::Debug for SignatureCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignatureCandidate({} bytes)", self.0.len())
    }
}

impl QueryParameterSet {
    /// Splits a raw query string on `&` (dropping empty parts) and each part on its first `=`. A part without `=` is
    /// a key with an empty value.
    pub fn parse(raw_query: &str) -> Self {
        let pairs = raw_query
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (part.to_string(), String::new()),
            })
            .collect();
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The decoded pairs, in the order they were received.
    pub fn decoded(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.pairs.iter().map(|(k, v)| (decode_component(k), decode_component(v)))
    }

    /// The first decoded value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.decoded().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| decode_component(k) == key)
    }

    /// The raw (undecoded) values of every `signature` parameter.
    pub fn signatures(&self) -> Vec<&str> {
        self.pairs.iter().filter(|(k, _)| decode_component(k) == SIGNATURE_PARAM).map(|(_, v)| v.as_str()).collect()
    }

    /// Builds the canonical string: `signature` removed, values of repeated keys joined with `,` in arrival order,
    /// `key=value` pairs sorted byte-wise by key and concatenated without a separator.
    pub fn canonical_candidate(&self) -> SignatureCandidate {
        let mut grouped = BTreeMap::<String, Vec<String>>::new();
        for (key, value) in self.decoded().filter(|(k, _)| k != SIGNATURE_PARAM) {
            grouped.entry(key).or_default().push(value);
        }
        let candidate = grouped.into_iter().map(|(key, values)| format!("{key}={}", values.join(","))).collect();
        SignatureCandidate(candidate)
    }
}

/// Decodes one query string component the way a form-urlencoded parser does: `+` is a space, then `%XX` escapes are
/// resolved. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    let bytes = urlencoding::decode_binary(s.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
