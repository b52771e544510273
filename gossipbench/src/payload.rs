//! Synthetic update payloads
//!
//! Payloads are fixed-length strings drawn uniformly from lowercase ASCII
//! letters and digits. They carry no meaning; they only exercise the update
//! path of the gossip service. Generation is stateless and uses the
//! thread-local RNG, so it can be called from any number of workers at once.

use rand::Rng;

/// Payload length used when none is configured
pub const DEFAULT_PAYLOAD_LENGTH: usize = 200;

/// JSON field the payload is sent under
pub const PAYLOAD_FIELD: &str = "test-meta";

const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a payload of exactly `length` characters
pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

/// Generate a payload using the given RNG
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Copyable payload factory handed to dispatch workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadGenerator {
    length: usize,
}

impl PayloadGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> String {
        generate(self.length)
    }
}

impl Default for PayloadGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_valid(payload: &str) -> bool {
        payload
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }

    #[test]
    fn test_length_and_alphabet() {
        for length in [0, 1, 200, 10_000] {
            let payload = generate(length);
            assert_eq!(payload.len(), length);
            assert_eq!(payload.chars().count(), length);
            assert!(is_valid(&payload), "unexpected character in {payload:?}");
        }
    }

    #[test]
    fn test_default_generator() {
        let generator = PayloadGenerator::default();
        assert_eq!(generator.length(), DEFAULT_PAYLOAD_LENGTH);
        assert_eq!(generator.generate().len(), 200);
    }

    #[test]
    fn test_alphabet_is_covered() {
        // 36 symbols over 10k draws: every symbol shows up
        let payload = generate(10_000);
        let seen: HashSet<u8> = payload.bytes().collect();
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_concurrent_generation() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| generate(64)).collect::<Vec<_>>()))
            .collect();

        for handle in handles {
            for payload in handle.join().unwrap() {
                assert_eq!(payload.len(), 64);
                assert!(is_valid(&payload));
            }
        }
    }
}
