use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed modulus of the secondary hash used by double hashing.
///
/// This stays at 7 whatever the table size is. A general double hashing scheme would
/// pick a prime at least as large as the table, but the classroom examples are worked
/// out with 7 and changing it would change every one of them.
pub const SECONDARY_MODULUS: u64 = 7;

/// Collision resolution strategy used to place entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeMode {
    /// Colliding entries are appended to the bucket at `id % size`.
    Chaining,
    /// `(id % size + i) % size`
    Linear,
    /// `(id % size + i * i) % size`
    Quadratic,
    /// `(id % size + i * h2) % size` with `h2 = 7 - id % 7`
    DoubleHash,
}

impl ProbeMode {
    pub const ALL: [ProbeMode; 4] = [
        ProbeMode::Chaining,
        ProbeMode::Linear,
        ProbeMode::Quadratic,
        ProbeMode::DoubleHash,
    ];

    #[inline]
    pub fn is_open_addressing(self) -> bool {
        !matches!(self, ProbeMode::Chaining)
    }

    /// Returns the slot to try on attempt `attempt` (starting at 0) for `id` in a table of
    /// `size` slots. Every product is reduced modulo `size` in 128-bit arithmetic so large
    /// ids and attempt counts cannot overflow.
    pub fn candidate(self, id: u64, attempt: usize, size: usize) -> usize {
        assert!(size > 0, "a table must have at least one slot");
        let n: u128 = size as u128;
        let start: u128 = id as u128 % n;
        let i: u128 = attempt as u128 % n;
        let offset: u128 = match self {
            ProbeMode::Chaining => 0,
            ProbeMode::Linear => i,
            ProbeMode::Quadratic => (i * i) % n,
            ProbeMode::DoubleHash => (i * (double_hash_step(id) as u128 % n)) % n,
        };
        ((start + offset) % n) as usize
    }
}

/// The home slot of `id`, i.e. attempt 0 for every mode.
#[inline]
pub fn start_slot(id: u64, size: usize) -> usize {
    (id % size as u64) as usize
}

/// Step size of double hashing, always in `1..=SECONDARY_MODULUS`.
#[inline]
pub fn double_hash_step(id: u64) -> u64 {
    SECONDARY_MODULUS - (id % SECONDARY_MODULUS)
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            ProbeMode::Chaining => "chaining",
            ProbeMode::Linear => "linear",
            ProbeMode::Quadratic => "quadratic",
            ProbeMode::DoubleHash => "double",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown probe mode {0:?}")]
pub struct UnknownProbeMode(pub String);

impl FromStr for ProbeMode {
    type Err = UnknownProbeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chaining" | "chain" => Ok(ProbeMode::Chaining),
            "linear" => Ok(ProbeMode::Linear),
            "quadratic" => Ok(ProbeMode::Quadratic),
            "double" | "doublehash" | "double_hash" => Ok(ProbeMode::DoubleHash),
            _ => Err(UnknownProbeMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_zero_is_the_home_slot() {
        for mode in ProbeMode::ALL {
            for size in [1usize, 7, 10, 20, 64] {
                for id in [0u64, 3, 25, 999, u64::MAX] {
                    assert_eq!(mode.candidate(id, 0, size), start_slot(id, size));
                }
            }
        }
    }

    #[test]
    fn chaining_never_moves() {
        for attempt in 0..30 {
            assert_eq!(ProbeMode::Chaining.candidate(37, attempt, 10), 7);
        }
    }

    #[test]
    fn linear_walks_to_the_neighbour() {
        let seq: Vec<usize> = (0..4).map(|i| ProbeMode::Linear.candidate(28, i, 10)).collect();
        assert_eq!(seq, vec![8, 9, 0, 1]);
    }

    #[test]
    fn quadratic_jumps_by_squares() {
        let seq: Vec<usize> = (0..5).map(|i| ProbeMode::Quadratic.candidate(3, i, 10)).collect();
        assert_eq!(seq, vec![3, 4, 7, 2, 9]);
    }

    #[test]
    fn double_hash_uses_fixed_modulus() {
        // 12 % 7 = 5, so the step is 2
        assert_eq!(double_hash_step(12), 2);
        assert_eq!(double_hash_step(14), 7);
        let seq: Vec<usize> = (0..3).map(|i| ProbeMode::DoubleHash.candidate(12, i, 10)).collect();
        assert_eq!(seq, vec![2, 4, 6]);
        // same step at size 40: the modulus does not follow the table
        assert_eq!(ProbeMode::DoubleHash.candidate(12, 1, 40), 14);
    }

    #[test]
    fn huge_inputs_do_not_overflow() {
        let slot: usize = ProbeMode::Quadratic.candidate(u64::MAX, usize::MAX, 1 << 20);
        assert!(slot < 1 << 20);
        let slot: usize = ProbeMode::DoubleHash.candidate(u64::MAX, usize::MAX, 3);
        assert!(slot < 3);
    }

    #[test]
    fn parses_names() {
        for mode in ProbeMode::ALL {
            assert_eq!(mode.to_string().parse::<ProbeMode>(), Ok(mode));
        }
        assert_eq!("Double_Hash".parse::<ProbeMode>(), Ok(ProbeMode::DoubleHash));
        let err: UnknownProbeMode = "cuckoo".parse::<ProbeMode>().unwrap_err();
        assert_eq!(err, UnknownProbeMode("cuckoo".to_string()));
        assert_eq!(err.to_string(), "unknown probe mode \"cuckoo\"");
    }
}
