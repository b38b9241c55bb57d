//! Deterministic random streams keyed on the persisted session state.
//!
//! Each transition derives its stream from `(seed, revision, label)`, so
//! replaying the same document with the same action draws the same values,
//! while consecutive transitions never share a stream.

use maze_chase_core::SessionDocument;
use sha2::{Digest, Sha256};

/// Opens the labeled stream for the document's current revision.
pub(crate) fn stream(document: &SessionDocument, label: &str) -> SplitMix64 {
    SplitMix64::new(derive_stream_seed(document.seed, document.revision, label))
}

fn derive_stream_seed(seed: u64, revision: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(revision.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
pub(crate) struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform index below `bound`.
    pub(crate) fn next_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "next_index requires a positive bound");
        (self.next_u64() % bound as u64) as usize
    }
}
