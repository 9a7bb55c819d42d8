//! Keyed SHA-512 digest shared by request signing and reply verification.
//!
//! Paynow's hash is not an HMAC: the field values are concatenated in order,
//! without separators, the integration key is appended, and the result is
//! digested with SHA-512 and rendered as uppercase hexadecimal. Field order and
//! escaping are part of the contract; changing either changes the hash.

use sha2::{Digest, Sha512};

/// Length of a rendered hash in hexadecimal characters.
pub const HASH_LEN: usize = 128;

/// Computes the uppercase hex SHA-512 of `values` concatenated in order,
/// followed by `key`.
///
/// Values are hashed as raw bytes, so decoded reply values need not be UTF-8.
///
/// # Example
///
/// ```rust
/// use paynow::hash::{HASH_LEN, generate_hash};
///
/// let hash = generate_hash(["Ok", "http://x"], "secret");
/// assert_eq!(hash.len(), HASH_LEN);
/// assert_eq!(hash, generate_hash(["Okhttp://x"], "secret"));
/// ```
pub fn generate_hash<I, S>(values: I, key: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha512::new();
    for value in values {
        hasher.update(value.as_ref());
    }
    hasher.update(key.as_bytes());
    hex::encode_upper(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_uppercase_hex_of_expected_length() {
        let hash = generate_hash(["a", "b"], "k");
        assert_eq!(hash.len(), HASH_LEN);
        assert!(
            hash.chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let fields = ["http://result", "http://return", "INV-1", "10.000000"];
        assert_eq!(generate_hash(fields, "key"), generate_hash(fields, "key"));
    }

    #[test]
    fn test_hash_matches_known_digest() {
        // sha512("abc")
        let expected = "DDAF35A193617ABACC417349AE20413112E6FA4E89A97EA20A9EEEE64B55D39A\
                        2192992A274FC1A836BA3C23A3FEEBBD454D4423643CE80E2A9AC94FA54CA49F";
        assert_eq!(generate_hash(["a", "b"], "c"), expected);
    }

    #[test]
    fn test_hash_depends_on_order_and_key() {
        let base = generate_hash(["one", "two"], "key");
        assert_ne!(base, generate_hash(["two", "one"], "key"));
        assert_ne!(base, generate_hash(["one", "two"], "other"));
    }

    #[test]
    fn test_hash_accepts_non_utf8_bytes() {
        let raw: [&[u8]; 2] = [b"a", b"\xFFb"];
        assert_eq!(
            generate_hash(raw, "k"),
            generate_hash([b"a\xFF".as_slice(), b"b".as_slice()], "k")
        );
    }

    #[test]
    fn test_hash_of_no_values_is_hash_of_key() {
        let empty: [&str; 0] = [];
        assert_eq!(generate_hash(empty, "key"), generate_hash(["key"], ""));
    }
}
