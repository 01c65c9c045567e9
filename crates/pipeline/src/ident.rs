//! Random alphanumeric identifiers for storage and download filenames

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length used for generated storage filenames.
pub const FILE_ID_LEN: usize = 21;

/// Length used for downloaded result filenames.
pub const DOWNLOAD_ID_LEN: usize = 8;

/// Generate a random alphanumeric identifier of the given length.
///
/// Not cryptographic. Uniqueness is probabilistic; collisions are accepted
/// and never retried.
pub fn generate(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_length() {
        assert_eq!(generate(21).len(), 21);
        assert_eq!(generate(8).len(), 8);
        assert_eq!(generate(0).len(), 0);
    }

    #[test]
    fn test_alphabet_membership() {
        let id = generate(256);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_ids_differ() {
        assert_ne!(generate(FILE_ID_LEN), generate(FILE_ID_LEN));
    }
}
