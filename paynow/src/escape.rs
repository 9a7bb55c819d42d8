//! Query-component escaping compatible with the gateway.
//!
//! Paynow's reference integration escapes signed values as query components:
//! ASCII alphanumerics and `-_.~` pass through, a space becomes `+`, and every
//! other byte becomes `%XX` with uppercase hex digits. The signature covers the
//! escaped text, so the encoding must match byte for byte.

use std::fmt;

use url::form_urlencoded;

/// Escapes `value` as a query component.
///
/// # Example
///
/// ```rust
/// use paynow::escape::query_escape;
///
/// assert_eq!(query_escape("Bananas, Apples"), "Bananas%2C+Apples");
/// assert_eq!(query_escape("a~b*c"), "a~b%2Ac");
/// ```
#[must_use]
pub fn query_escape(value: &str) -> String {
    // `byte_serialize` keeps `*` and escapes `~`; the gateway does the opposite.
    // Encoded output only contains `%7E` where the input had `~`.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// A malformed percent-escape in a query component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnescapeError {
    /// The offending input.
    pub input: String,
}

impl fmt::Display for UnescapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid escape sequence in {:?}", self.input)
    }
}

impl std::error::Error for UnescapeError {}

/// Strictly unescapes a query component to text.
///
/// Like [`query_unescape_bytes`], and additionally rejects a result that is
/// not UTF-8.
///
/// # Errors
///
/// Returns [`UnescapeError`] if `value` is not a well-formed query component
/// or does not decode to UTF-8.
pub fn query_unescape(value: &str) -> Result<String, UnescapeError> {
    String::from_utf8(query_unescape_bytes(value)?).map_err(|_| UnescapeError {
        input: value.to_owned(),
    })
}

/// Strictly unescapes a query component to raw bytes.
///
/// `+` decodes to a space and `%XX` to the byte `XX`. Unlike the tolerant
/// decoder used for parsing, a truncated or non-hex escape is an error.
///
/// # Errors
///
/// Returns [`UnescapeError`] if `value` is not a well-formed query component.
pub fn query_unescape_bytes(value: &str) -> Result<Vec<u8>, UnescapeError> {
    let malformed = || UnescapeError {
        input: value.to_owned(),
    };
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
                let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(malformed());
                };
                decoded.push((hi << 4) | lo);
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }
    Ok(decoded)
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_keeps_unreserved() {
        assert_eq!(query_escape("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn test_escape_reserved_and_space() {
        assert_eq!(
            query_escape("buyer+1@example.com"),
            "buyer%2B1%40example.com"
        );
        assert_eq!(query_escape("Tea, Milk"), "Tea%2C+Milk");
        assert_eq!(query_escape("a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
        assert_eq!(query_escape("x*y"), "x%2Ay");
    }

    #[test]
    fn test_escape_non_ascii_uses_uppercase_hex() {
        assert_eq!(query_escape("café"), "caf%C3%A9");
    }

    #[test]
    fn test_escape_literal_percent_sequence_is_not_rewritten() {
        assert_eq!(query_escape("%7E"), "%257E");
    }

    #[test]
    fn test_unescape_decodes_plus_and_percent() {
        assert_eq!(
            query_unescape("http%3A%2F%2Fx%3fa=1+2").as_deref(),
            Ok("http://x?a=1 2")
        );
    }

    #[test]
    fn test_unescape_rejects_malformed_escapes() {
        assert!(query_unescape("100%").is_err());
        assert!(query_unescape("%4").is_err());
        assert!(query_unescape("%ZZ").is_err());
        assert!(query_unescape("%FF").is_err());
        assert!(query_unescape_bytes("%4").is_err());
    }

    #[test]
    fn test_unescape_bytes_keeps_non_utf8() {
        assert_eq!(query_unescape_bytes("a%FF+b"), Ok(b"a\xFF b".to_vec()));
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let original = "Bananas, Apples & Pears ~ 50% off *today*";
        assert_eq!(
            query_unescape(&query_escape(original)).as_deref(),
            Ok(original)
        );
    }
}
