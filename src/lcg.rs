//! # LCG — Full-Period Linear Congruential Generator
//!
//! Streams a pseudorandom permutation of `[0, m)` in O(1) memory, as the
//! alternative to materializing and shuffling every offset of a range.
//!
//! ## Algorithm
//!
//! The recurrence `x' = (a·x + c) mod m` visits every residue exactly once per
//! cycle iff (Hull–Dobell):
//!
//! 1. `gcd(m, c) = 1`,
//! 2. `a - 1` is divisible by every prime factor of `m`,
//! 3. `a - 1` is divisible by 4 when `m` is.
//!
//! Construction only supports `m ≡ 0 (mod 4)`. With `L = lcm(4, p₁, …, pₖ)` over
//! the distinct primes of `m`, every `a = k·L + 1` satisfies (2) and (3), and
//! since `L | m` the multipliers below `m` are exactly `k ∈ [0, m/L)`. `c` is
//! rejection-sampled until coprime to `m`.
//!
//! ## References
//!
//! - T. E. Hull, A. R. Dobell, "Random Number Generators", SIAM Review 4(3), 1962.
//! - D. E. Knuth, TAOCP Vol. 2, §3.2.1.2, Theorem A.

use rand::Rng;

/// Errors from LCG construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LcgError {
    /// The construction only handles moduli divisible by 4.
    #[error("unsupported modulus {modulus}: only moduli divisible by 4 are supported")]
    UnsupportedModulus { modulus: u64 },

    /// Explicit parameters that do not give a full period.
    #[error("parameters a={multiplier}, c={increment} do not give a full period mod {modulus}")]
    NotFullPeriod {
        modulus: u64,
        multiplier: u64,
        increment: u64,
    },
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Distinct prime factors of `n` in ascending order, by trial division.
///
/// Returns an empty vector for `n < 2`.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    if n % 2 == 0 && n > 0 {
        factors.push(2);
        while n % 2 == 0 {
            n /= 2;
        }
    }
    let mut p = 3u64;
    while p.saturating_mul(p) <= n {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 2;
    }
    if n > 2 {
        factors.push(n);
    }
    factors
}

/// A Hull–Dobell LCG over `[0, modulus)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    modulus: u64,
    multiplier: u64,
    increment: u64,
    state: u64,
}

impl Lcg {
    /// Build a full-period generator for `modulus`, starting from `seed`,
    /// using the thread-local RNG for parameter sampling.
    pub fn new(seed: u64, modulus: u64) -> Result<Self, LcgError> {
        Self::with_rng(seed, modulus, &mut rand::rng())
    }

    /// As [`Lcg::new`], drawing the increment and multiplier from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(seed: u64, modulus: u64, rng: &mut R) -> Result<Self, LcgError> {
        if modulus == 0 || modulus % 4 != 0 {
            return Err(LcgError::UnsupportedModulus { modulus });
        }

        let mut increment = rng.random_range(0..modulus);
        while gcd(modulus, increment) != 1 {
            increment = rng.random_range(0..modulus);
        }

        // 2 is already covered by the factor 4.
        let lattice = prime_factors(modulus)
            .into_iter()
            .filter(|&p| p != 2)
            .fold(4u64, |acc, p| acc * p);
        let steps = modulus / lattice;
        // With a single lattice step the only valid multiplier below m is 1.
        let k = if steps > 1 { rng.random_range(1..steps) } else { 0 };
        let multiplier = k * lattice + 1;

        Ok(Lcg {
            modulus,
            multiplier,
            increment,
            state: seed % modulus,
        })
    }

    /// Build a generator from explicit parameters, rejecting any that would
    /// not cover the whole modulus.
    pub fn from_parts(modulus: u64, multiplier: u64, increment: u64, seed: u64) -> Result<Self, LcgError> {
        if modulus == 0 || modulus % 4 != 0 {
            return Err(LcgError::UnsupportedModulus { modulus });
        }
        let lcg = Lcg {
            modulus,
            multiplier: multiplier % modulus,
            increment: increment % modulus,
            state: seed % modulus,
        };
        if !lcg.satisfies_hull_dobell() {
            return Err(LcgError::NotFullPeriod {
                modulus,
                multiplier,
                increment,
            });
        }
        Ok(lcg)
    }

    /// Advance one step and return the new state.
    #[inline]
    pub fn step(&mut self) -> u64 {
        // a, x < m ≤ 2^64, so the product fits in u128.
        let next = (self.multiplier as u128 * self.state as u128 + self.increment as u128)
            % self.modulus as u128;
        self.state = next as u64;
        self.state
    }

    /// Check the three Hull–Dobell conditions for the current parameters.
    pub fn satisfies_hull_dobell(&self) -> bool {
        let m = self.modulus;
        // a = 0 is a ≡ m, so a - 1 ≡ m - 1.
        let a_minus_1 = if self.multiplier == 0 { m - 1 } else { self.multiplier - 1 };
        gcd(m, self.increment) == 1
            && prime_factors(m).iter().all(|&p| a_minus_1 % p == 0)
            && (m % 4 != 0 || a_minus_1 % 4 == 0)
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    pub fn state(&self) -> u64 {
        self.state
    }
}

/// Endless stream of states; one full cycle is `modulus` items.
impl Iterator for Lcg {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Collect one full cycle and assert it is a permutation of [0, m).
    fn assert_full_cycle(lcg: &mut Lcg) {
        let m = lcg.modulus() as usize;
        let mut seen = vec![false; m];
        for i in 0..m {
            let v = lcg.step() as usize;
            assert!(!seen[v], "value {} repeated after {} steps (m={})", v, i, m);
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    // ── Number Theory Helpers ───────────────────────────────────────

    #[test]
    fn gcd_known_values() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(17, 5), 1);
        assert_eq!(gcd(0, 9), 9);
        assert_eq!(gcd(9, 0), 9);
    }

    #[test]
    fn prime_factors_are_distinct() {
        assert_eq!(prime_factors(1024), vec![2]);
        assert_eq!(prime_factors(360), vec![2, 3, 5]);
        assert_eq!(prime_factors(97), vec![97]);
        assert_eq!(prime_factors(4 * 1_000_003), vec![2, 1_000_003]);
        assert!(prime_factors(1).is_empty());
    }

    // ── Construction ────────────────────────────────────────────────

    /// Moduli not divisible by 4 are refused; callers fall back to shuffling.
    #[test]
    fn rejects_modulus_not_divisible_by_four() {
        for m in [1u64, 2, 3, 6, 10, 1000 + 2] {
            assert_eq!(Lcg::new(0, m), Err(LcgError::UnsupportedModulus { modulus: m }));
        }
        assert_eq!(Lcg::new(0, 0), Err(LcgError::UnsupportedModulus { modulus: 0 }));
    }

    #[test]
    fn sampled_parameters_satisfy_hull_dobell() {
        let mut rng = StdRng::seed_from_u64(7);
        for m in [4u64, 8, 12, 36, 100, 1024, 3600, 1 << 20] {
            for _ in 0..20 {
                let lcg = Lcg::with_rng(0, m, &mut rng).unwrap();
                assert!(lcg.satisfies_hull_dobell(), "{:?}", lcg);
                assert!(lcg.multiplier() < m);
                assert!(lcg.increment() < m);
            }
        }
    }

    /// With m = L the only multiplier below m congruent to 1 mod L is 1.
    #[test]
    fn single_lattice_step_uses_unit_multiplier() {
        let mut rng = StdRng::seed_from_u64(1);
        for m in [4u64, 12, 60] {
            let lcg = Lcg::with_rng(0, m, &mut rng).unwrap();
            assert_eq!(lcg.multiplier(), 1);
        }
    }

    #[test]
    fn multiplier_excludes_one_when_room_exists() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let lcg = Lcg::with_rng(0, 1024, &mut rng).unwrap();
            assert_ne!(lcg.multiplier(), 1);
            assert_eq!((lcg.multiplier() - 1) % 4, 0);
        }
    }

    #[test]
    fn seed_becomes_initial_state() {
        let lcg = Lcg::new(17, 64).unwrap();
        assert_eq!(lcg.state(), 17);
    }

    // ── Full Period ─────────────────────────────────────────────────

    #[test]
    fn full_period_over_powers_of_two() {
        let mut rng = StdRng::seed_from_u64(42);
        for m in [4u64, 32, 1024, 32 * 32 * 32] {
            let mut lcg = Lcg::with_rng(rng.random_range(0..m), m, &mut rng).unwrap();
            assert_full_cycle(&mut lcg);
        }
    }

    #[test]
    fn full_period_over_composite_moduli() {
        let mut rng = StdRng::seed_from_u64(9);
        for m in [12u64, 20, 36, 100, 900, 1020, 9996] {
            let mut lcg = Lcg::with_rng(5 % m, m, &mut rng).unwrap();
            assert_full_cycle(&mut lcg);
        }
    }

    /// After exactly m steps the generator is back at the seed, so step m+1
    /// repeats the first value of the cycle.
    #[test]
    fn cycle_repeats_after_modulus_steps() {
        let m = 256u64;
        let mut lcg = Lcg::new(99, m).unwrap();
        let first = lcg.step();
        for _ in 1..m {
            lcg.step();
        }
        assert_eq!(lcg.state(), 99);
        assert_eq!(lcg.step(), first);
    }

    #[test]
    fn iterator_matches_step() {
        let a = Lcg::from_parts(16, 5, 3, 0).unwrap();
        let mut b = a.clone();
        let from_iter: Vec<u64> = a.take(16).collect();
        let from_step: Vec<u64> = (0..16).map(|_| b.step()).collect();
        assert_eq!(from_iter, from_step);
    }

    // ── Explicit Parameters ─────────────────────────────────────────

    /// a=5, c=3, m=16: 0 -> 3 -> 2 -> 13 -> 4 -> ...
    #[test]
    fn from_parts_known_sequence() {
        let mut lcg = Lcg::from_parts(16, 5, 3, 0).unwrap();
        assert_eq!(lcg.by_ref().take(4).collect::<Vec<_>>(), vec![3, 2, 13, 4]);
    }

    #[test]
    fn from_parts_rejects_short_period() {
        // a - 1 = 2 is not divisible by 4.
        assert!(matches!(
            Lcg::from_parts(16, 3, 1, 0),
            Err(LcgError::NotFullPeriod { .. })
        ));
        // c shares the factor 2 with m.
        assert!(matches!(
            Lcg::from_parts(16, 5, 2, 0),
            Err(LcgError::NotFullPeriod { .. })
        ));
        assert_eq!(
            Lcg::from_parts(10, 1, 1, 0),
            Err(LcgError::UnsupportedModulus { modulus: 10 })
        );
    }

    #[test]
    fn large_modulus_steps_without_overflow() {
        let m = 1u64 << 60;
        let mut lcg = Lcg::new(m - 1, m).unwrap();
        for _ in 0..1000 {
            assert!(lcg.step() < m);
        }
    }
}
