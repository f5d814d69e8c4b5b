//! Connect-payload byte shuffling.
//!
//! After `ConnectRequest3` is serialized, everything past the 13-byte header
//! (type byte, zero public id, rng seed) is permuted with a swap sequence
//! drawn from a Java-compatible PRNG seeded by the transmitted seed. The
//! server regenerates the same sequence to undo the permutation.

use nebulous_types::PacketType;

use crate::codec::{CodecError, CodecResult};
use crate::rng::JavaRandom;

/// Header bytes exempt from shuffling.
pub const SHUFFLE_HEADER_LEN: usize = 13;

fn swap_sequence(len: usize, rng_seed: i64) -> Vec<(usize, usize)> {
    let mut rng = JavaRandom::new(rng_seed);
    let mut swaps = Vec::with_capacity(len - (SHUFFLE_HEADER_LEN + 1));
    // index 0 of the shuffled region is only ever a swap target, never a
    // source; this matches the server
    for i in (1..=len - (SHUFFLE_HEADER_LEN + 1)).rev() {
        let j = rng.next_int_bound(i as i32 + 1) as usize;
        swaps.push((i + SHUFFLE_HEADER_LEN, j + SHUFFLE_HEADER_LEN));
    }
    swaps
}

/// Permute `packet[13..]` in place. Packets of 14 bytes or fewer have
/// nothing to shuffle.
pub fn shuffle_connect_payload(packet: &mut [u8], rng_seed: i64) {
    if packet.len() <= SHUFFLE_HEADER_LEN + 1 {
        return;
    }
    for (a, b) in swap_sequence(packet.len(), rng_seed) {
        packet.swap(a, b);
    }
}

/// Invert [`shuffle_connect_payload`]: replay the identical swap sequence in
/// reverse order.
pub fn unshuffle_connect_payload(packet: &mut [u8], rng_seed: i64) {
    if packet.len() <= SHUFFLE_HEADER_LEN + 1 {
        return;
    }
    for &(a, b) in swap_sequence(packet.len(), rng_seed).iter().rev() {
        packet.swap(a, b);
    }
}

/// Post-shuffle self check: the 13-byte header must have survived intact.
pub fn verify_connect_header(packet: &[u8], rng_seed: i64) -> CodecResult<()> {
    if packet.len() < SHUFFLE_HEADER_LEN {
        return Err(CodecError::ShuffleCorrupted);
    }
    if packet[0] != PacketType::ConnectRequest3 as u8 {
        return Err(CodecError::ShuffleCorrupted);
    }
    if packet[1..5] != [0, 0, 0, 0] {
        return Err(CodecError::ShuffleCorrupted);
    }
    if packet[5..13] != rng_seed.to_be_bytes() {
        return Err(CodecError::ShuffleCorrupted);
    }
    Ok(())
}
