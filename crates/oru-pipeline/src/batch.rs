//! Parallel decoding of many payloads
//!
//! The assembler holds no state, so payloads can be decoded on a rayon
//! pool. Results come back in input order.

use oru_core::{DecodeError, Decoded, MessageAssembler, OruError, Result};
use rayon::prelude::*;
use tracing::debug;

pub struct BatchDecoder {
    assembler: MessageAssembler,
    pool: Option<rayon::ThreadPool>,
}

impl BatchDecoder {
    /// Decode on the global rayon pool
    pub fn new() -> Self {
        Self {
            assembler: MessageAssembler::new(),
            pool: None,
        }
    }

    /// Decode on a dedicated pool of `threads` workers
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("oru-decode-{index}"))
            .build()
            .map_err(|e| OruError::internal_error(format!("could not build decode pool: {e}")))?;

        debug!("Built decode pool with {} threads", threads);
        Ok(Self {
            assembler: MessageAssembler::new(),
            pool: Some(pool),
        })
    }

    /// Decode every payload; the i-th result belongs to the i-th payload
    pub fn decode_all<P>(&self, payloads: &[P]) -> Vec<std::result::Result<Decoded, DecodeError>>
    where
        P: AsRef<[u8]> + Sync,
    {
        let decode = || {
            payloads
                .par_iter()
                .map(|payload| self.assembler.decode(payload.as_ref()))
                .collect()
        };

        match &self.pool {
            Some(pool) => pool.install(decode),
            None => decode(),
        }
    }
}

impl Default for BatchDecoder {
    fn default() -> Self {
        Self::new()
    }
}
