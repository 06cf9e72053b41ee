use std::fmt;

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_FRAGMENT_LEN: usize = 11;

/// Opaque reference appended to the guide link.
///
/// A base-36 millisecond timestamp joined to a random base-36 fragment. Two
/// tokens minted in the same millisecond still differ through the fragment;
/// nothing else guarantees uniqueness and tokens never expire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn generate() -> Self {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self::generate_at(millis)
    }

    pub fn generate_at(epoch_millis: u64) -> Self {
        Self::generate_with(epoch_millis, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(epoch_millis: u64, rng: &mut R) -> Self {
        let fragment: String = (0..RANDOM_FRAGMENT_LEN)
            .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
            .collect();
        Self(format!("{}-{}", to_base36(epoch_millis), fragment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attach the token to the guide link as the `ref` query parameter.
pub fn access_url(guide_url: &str, token: &AccessToken) -> String {
    let separator = if guide_url.contains('?') { '&' } else { '?' };
    format!("{guide_url}{separator}ref={token}")
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_token_shape(raw: &str) -> bool {
        let Some((time, fragment)) = raw.split_once('-') else {
            return false;
        };
        let base36 = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        };
        base36(time) && base36(fragment)
    }

    #[test]
    fn encodes_timestamp_in_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_727_000_000_000), "m1df7ke8");
    }

    #[test]
    fn token_has_time_prefix_and_random_fragment() {
        let token = AccessToken::generate_at(1_727_000_000_000);
        let (time, fragment) = token.as_str().split_once('-').expect("separator");
        assert_eq!(time, "m1df7ke8");
        assert_eq!(fragment.len(), RANDOM_FRAGMENT_LEN);
        assert!(is_token_shape(token.as_str()));
    }

    #[test]
    fn tokens_minted_in_the_same_millisecond_differ() {
        let first = AccessToken::generate_at(1_727_000_000_000);
        let second = AccessToken::generate_at(1_727_000_000_000);
        assert_ne!(first, second);
    }

    #[test]
    fn generated_tokens_match_the_public_shape() {
        for _ in 0..50 {
            assert!(is_token_shape(AccessToken::generate().as_str()));
        }
    }

    #[test]
    fn access_url_appends_ref_parameter() {
        let token = AccessToken("abc-123".to_string());
        assert_eq!(
            access_url("https://gamma.app/docs/guide", &token),
            "https://gamma.app/docs/guide?ref=abc-123"
        );
        assert_eq!(
            access_url("https://gamma.app/docs/guide?mode=present", &token),
            "https://gamma.app/docs/guide?mode=present&ref=abc-123"
        );
    }
}
