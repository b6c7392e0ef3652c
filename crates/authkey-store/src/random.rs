use anyhow::Context;
use authkey_core::TokenSource;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Bytes at or above this are redrawn so every character is equally likely.
const ACCEPT_BELOW: u8 = 248;

/// Alphanumeric tokens drawn from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenSource;

impl TokenSource for OsTokenSource {
    fn generate(&self, len: usize) -> anyhow::Result<String> {
        let mut token = String::with_capacity(len);
        let mut buf = [0u8; 64];

        while token.len() < len {
            OsRng
                .try_fill_bytes(&mut buf)
                .context("OS random source unavailable")?;

            for &byte in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
                if token.len() == len {
                    break;
                }
                let idx = usize::from(byte) % ALPHABET.len();
                token.push(char::from(ALPHABET[idx]));
            }
        }

        buf.zeroize();
        Ok(token)
    }
}
