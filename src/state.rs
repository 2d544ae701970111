use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

// 32 bytes of entropy, base64url-encoded to 43 characters.
const STATE_BYTES: usize = 32;

/// Generate a fresh CSRF state token.
///
/// The token is unpredictable and URL-safe. Callers keep it across the
/// authorization redirect and hand it back at exchange time so the callback
/// can be tied to a flow this process started.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_state_is_long_enough() {
        assert!(generate_state().len() >= 32);
    }

    #[test]
    fn test_state_uses_url_safe_alphabet() {
        let state = generate_state();
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_states_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_state()), "duplicate state generated");
        }
    }
}
