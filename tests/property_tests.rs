//! Property-based tests for keysweep's traversal primitives.
//!
//! These tests use the `proptest` framework to check invariants across
//! randomly generated inputs rather than a handful of fixed examples.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! # Testing strategy
//!
//! - **Codec**: width, alphabet membership, injectivity.
//! - **LCG**: full period for arbitrary multiples of 4, Hull–Dobell parameters.
//! - **Partition**: completeness and disjointness with and without fair
//!   distribution.
//! - **Sequence**: every mode emits each offset of its range exactly once.

use keysweep::codec::{self, CHARSET};
use keysweep::lcg::Lcg;
use keysweep::partition::{partition, Range};
use keysweep::sequence::{OffsetSequence, TraversalMode};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn any_mode() -> impl Strategy<Value = TraversalMode> {
    prop_oneof![
        Just(TraversalMode::Sequential),
        Just(TraversalMode::Shuffled),
        Just(TraversalMode::Lcg),
    ]
}

// == Codec =====================================================================

proptest! {
    /// encode(offset, length) is exactly `length` alphabet characters.
    #[test]
    fn prop_encode_width_and_alphabet(length in 1u32..=12, raw in any::<u64>()) {
        let offset = raw % codec::keyspace_size(length);
        let s = codec::encode(offset, length as usize);
        prop_assert_eq!(s.len(), length as usize);
        prop_assert!(s.bytes().all(|b| CHARSET.contains(&b)), "{} has a foreign symbol", s);
    }

    /// Distinct in-range offsets give distinct strings.
    #[test]
    fn prop_encode_injective(length in 1u32..=12, a in any::<u64>(), b in any::<u64>()) {
        let total = codec::keyspace_size(length);
        let (a, b) = (a % total, b % total);
        prop_assume!(a != b);
        prop_assert_ne!(codec::encode(a, length as usize), codec::encode(b, length as usize));
    }

    /// Reading the string back as base-32 digits recovers the offset.
    #[test]
    fn prop_encode_digit_values_roundtrip(length in 1u32..=12, raw in any::<u64>()) {
        let offset = raw % codec::keyspace_size(length);
        let decoded = codec::encode(offset, length as usize)
            .bytes()
            .fold(0u64, |acc, b| {
                let digit = CHARSET.iter().position(|&c| c == b).unwrap() as u64;
                acc * 32 + digit
            });
        prop_assert_eq!(decoded, offset);
    }
}

// == LCG =======================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For any modulus divisible by 4, one cycle is a permutation of [0, m)
    /// and the next step repeats the cycle's first value.
    #[test]
    fn prop_lcg_full_period(quarter in 1u64..2048, seed in any::<u64>(), rng_seed in any::<u64>()) {
        let m = quarter * 4;
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let mut lcg = Lcg::with_rng(seed % m, m, &mut rng).unwrap();
        prop_assert!(lcg.satisfies_hull_dobell());

        let mut seen = vec![false; m as usize];
        let first = lcg.step();
        seen[first as usize] = true;
        for _ in 1..m {
            let v = lcg.step() as usize;
            prop_assert!(!seen[v], "repeat of {} before full period (m={})", v, m);
            seen[v] = true;
        }
        prop_assert!(seen.iter().all(|&s| s));
        prop_assert_eq!(lcg.step(), first);
    }

    #[test]
    fn prop_lcg_rejects_non_multiples_of_four(m in 1u64..100_000) {
        prop_assume!(m % 4 != 0);
        prop_assert!(Lcg::new(0, m).is_err());
    }
}

// == Partition =================================================================

proptest! {
    /// Without fair distribution the node ranges tile [0, total) exactly.
    #[test]
    fn prop_partition_tiles_keyspace(total in 0u64..1_000_000, nodes in 1u64..64) {
        let mut expected_offset = 0;
        for i in 0..nodes {
            let r = partition(total, i, nodes, false);
            prop_assert_eq!(r.offset, expected_offset);
            prop_assert!(r.offset <= r.limit);
            expected_offset = r.limit;
        }
        prop_assert_eq!(expected_offset, total);
    }

    /// With fair distribution ranges stay disjoint and contiguous, and exactly
    /// `total % nodes` trailing offsets are left out.
    #[test]
    fn prop_fair_partition_drops_remainder(total in 0u64..1_000_000, nodes in 1u64..64) {
        let mut covered = 0u64;
        let mut expected_offset = 0;
        for i in 0..nodes {
            let r = partition(total, i, nodes, true);
            prop_assert_eq!(r.offset, expected_offset);
            prop_assert_eq!(r.len(), total / nodes);
            covered += r.len();
            expected_offset = r.limit;
        }
        prop_assert_eq!(total - covered, total % nodes);
    }
}

// == Sequence ==================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each mode emits every offset in [offset, limit) exactly once;
    /// sequential mode in ascending order.
    #[test]
    fn prop_sequence_covers_range_once(
        offset in 0u64..100_000,
        len in 0u64..4096,
        mode in any_mode(),
        rng_seed in any::<u64>(),
    ) {
        let range = Range::new(offset, offset + len);
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let emitted: Vec<u64> = OffsetSequence::with_rng(range, mode, &mut rng).collect();
        prop_assert_eq!(emitted.len() as u64, len);
        if mode == TraversalMode::Sequential {
            prop_assert!(emitted.windows(2).all(|w| w[0] < w[1]));
        }
        let mut sorted = emitted;
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (offset..offset + len).collect::<Vec<_>>());
    }
}
