//! Pairwise-independent affine hash family over a prime field
//!
//! Each [`HashFunction`] maps a token to `(a·x + b) mod M`, where `x` is the
//! token's xxh3 digest reduced modulo `M`. Drawing `a` and `b` independently
//! and uniformly gives a pairwise-independent family when `M` is prime.

use crate::traits::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xxhash_rust::xxh3::xxh3_64;

/// Default modulus: the Mersenne prime 2^61 - 1
pub const DEFAULT_MODULUS: u64 = (1 << 61) - 1;

/// Smallest modulus accepted by [`HashFamily`]
pub const MIN_MODULUS: u64 = 65_537;

/// A single affine hash function `(a·x + b) mod M`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashFunction {
    a: u64,
    b: u64,
    modulus: u64,
}

impl HashFunction {
    /// Draw a new function with `a, b` uniform in `[1, modulus)`
    ///
    /// `modulus` must be prime and larger than the number of distinct tokens
    /// expected, otherwise collisions skew the estimates built on top. This is
    /// not checked here; [`HashFamily::new`] validates it.
    pub fn new<R: Rng + ?Sized>(modulus: u64, rng: &mut R) -> Self {
        Self {
            a: rng.gen_range(1..modulus),
            b: rng.gen_range(1..modulus),
            modulus,
        }
    }

    /// The prime modulus `M`
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Hash a token into `[0, M)`
    #[inline]
    pub fn apply(&self, token: &[u8]) -> u64 {
        let x = xxh3_64(token) % self.modulus;
        self.apply_int(x)
    }

    /// Apply the affine transform to an integer already reduced below `M`
    #[inline]
    pub fn apply_int(&self, x: u64) -> u64 {
        let m = self.modulus as u128;
        ((self.a as u128 * x as u128 + self.b as u128) % m) as u64
    }
}

/// Validated source of independent [`HashFunction`]s sharing one modulus
///
/// All draws come from a single seeded generator, so a family built with the
/// same modulus and seed always yields the same functions.
#[derive(Clone, Debug)]
pub struct HashFamily {
    modulus: u64,
    rng: StdRng,
}

impl HashFamily {
    /// Create a family over `modulus`, seeding its generator with `seed`
    ///
    /// # Errors
    ///
    /// [`ConfigError::ModulusTooSmall`] if `modulus < MIN_MODULUS`,
    /// [`ConfigError::NonPrimeModulus`] if `modulus` is composite.
    pub fn new(modulus: u64, seed: u64) -> Result<Self, ConfigError> {
        if modulus < MIN_MODULUS {
            return Err(ConfigError::ModulusTooSmall {
                modulus,
                minimum: MIN_MODULUS,
            });
        }
        if !is_prime(modulus) {
            return Err(ConfigError::NonPrimeModulus(modulus));
        }

        Ok(Self {
            modulus,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// The shared modulus
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Draw the next independent function
    pub fn draw(&mut self) -> HashFunction {
        HashFunction::new(self.modulus, &mut self.rng)
    }
}

#[inline]
fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Deterministic Miller-Rabin primality test, exact for every `u64`
pub fn is_prime(n: u64) -> bool {
    // The first twelve primes are a sufficient witness set below 2^64
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut r = 0u32;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime_small() {
        let primes: Vec<u64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
    }

    #[test]
    fn test_is_prime_large() {
        assert!(is_prime(DEFAULT_MODULUS));
        assert!(is_prime(MIN_MODULUS));
        assert!(is_prime(1_000_000_007));
        assert!(is_prime(18_446_744_073_709_551_557)); // largest u64 prime
        assert!(!is_prime(DEFAULT_MODULUS - 2));
        assert!(!is_prime(1_000_000_007 * 3));
        // Strong pseudoprime to bases 2, 3, 5, 7
        assert!(!is_prime(3_215_031_751));
        assert!(!is_prime(u64::MAX));
    }

    #[test]
    fn test_family_rejects_bad_modulus() {
        assert_eq!(
            HashFamily::new(7, 1).unwrap_err(),
            ConfigError::ModulusTooSmall {
                modulus: 7,
                minimum: MIN_MODULUS
            }
        );
        assert_eq!(
            HashFamily::new(65_536 * 2, 1).unwrap_err(),
            ConfigError::NonPrimeModulus(131_072)
        );
        assert!(HashFamily::new(MIN_MODULUS, 1).is_ok());
    }

    #[test]
    fn test_apply_in_range_and_deterministic() {
        let mut family = HashFamily::new(MIN_MODULUS, 42).unwrap();
        let h = family.draw();

        for i in 0..1000 {
            let token = format!("token_{}", i);
            let v = h.apply(token.as_bytes());
            assert!(v < MIN_MODULUS);
            assert_eq!(v, h.apply(token.as_bytes()));
        }
    }

    #[test]
    fn test_same_seed_same_functions() {
        let mut f1 = HashFamily::new(DEFAULT_MODULUS, 7).unwrap();
        let mut f2 = HashFamily::new(DEFAULT_MODULUS, 7).unwrap();

        for _ in 0..10 {
            assert_eq!(f1.draw(), f2.draw());
        }
    }

    #[test]
    fn test_draws_are_independent() {
        let mut family = HashFamily::new(DEFAULT_MODULUS, 7).unwrap();
        let h1 = family.draw();
        let h2 = family.draw();

        assert_ne!(h1, h2);
        assert_ne!(h1.apply(b"hello"), h2.apply(b"hello"));
    }

    #[test]
    fn test_apply_int_affine() {
        let h = HashFunction {
            a: 3,
            b: 5,
            modulus: 11,
        };
        assert_eq!(h.apply_int(0), 5);
        assert_eq!(h.apply_int(2), 0);
        assert_eq!(h.apply_int(10), 2);
    }
}
