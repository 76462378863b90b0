use anyhow::anyhow;
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};

use crate::domain::ports::TokenGenerator;

/// URL-safe alphabet; 64 symbols so each random byte maps without bias.
const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Short random identifiers drawn from the system CSPRNG.
pub struct ShortIdGenerator {
    rng: SystemRandom,
    length: usize,
}

impl ShortIdGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            rng: SystemRandom::new(),
            length: length.max(1),
        }
    }

    pub fn generate_sync(&self) -> anyhow::Result<String> {
        let mut bytes = vec![0u8; self.length];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow!("system random source unavailable"))?;
        Ok(bytes
            .into_iter()
            .map(|b| ALPHABET[usize::from(b & 63)] as char)
            .collect())
    }
}

#[async_trait]
impl TokenGenerator for ShortIdGenerator {
    async fn generate(&self) -> anyhow::Result<String> {
        self.generate_sync()
    }
}
