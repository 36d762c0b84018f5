//! AES-256 counter-mode payload cipher
//!
//! The counter block starts at 1 (128-bit big-endian) and is never
//! transmitted, so a key must only ever encrypt one payload.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

use crate::error::{VaultError, VaultResult};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

pub const KEY_LEN: usize = 32;

const INITIAL_COUNTER: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

/// Encrypt a payload of any length. Output length equals input length.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> VaultResult<Vec<u8>> {
    apply_keystream(plaintext, key)
}

/// Decrypt a payload produced by [`encrypt`] with the same key.
///
/// There is no integrity check: a wrong key or corrupted ciphertext yields
/// garbage of the same length.
pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> VaultResult<Vec<u8>> {
    apply_keystream(ciphertext, key)
}

fn apply_keystream(input: &[u8], key: &[u8]) -> VaultResult<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(VaultError::CipherPrecondition {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }

    let mut cipher = Aes256Ctr::new_from_slices(key, &INITIAL_COUNTER).map_err(|_| {
        VaultError::CipherPrecondition {
            expected: KEY_LEN,
            actual: key.len(),
        }
    })?;

    let mut buffer = input.to_vec();
    cipher.apply_keystream(&mut buffer);

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystream_is_not_identity() {
        let key = [7u8; KEY_LEN];
        let plaintext = vec![0u8; 64];

        let ciphertext = encrypt(&plaintext, &key).unwrap();

        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(ciphertext, plaintext);
    }

    #[test]
    fn test_counter_starts_at_one() {
        use aes::cipher::{BlockEncrypt, KeyInit};

        // First keystream block is AES_k(counter=1)
        let key = [0x42u8; KEY_LEN];
        let block_cipher = Aes256::new_from_slice(&key).unwrap();
        let mut block = aes::Block::clone_from_slice(&INITIAL_COUNTER);
        block_cipher.encrypt_block(&mut block);

        let keystream = encrypt(&[0u8; 16], &key).unwrap();

        assert_eq!(keystream.as_slice(), block.as_slice());
    }
}
