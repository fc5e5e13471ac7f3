use crate::blind_signature::error::KeyError;
use log::*;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;

/// Fixed public exponent, the usual F4.
pub const PUBLIC_EXPONENT: u32 = 65537;

/// Floor on the modulus size. Far below anything secure; it exists so tests can use small,
/// fast keys while catching degenerate parameters.
pub const MIN_MODULUS_BITS: usize = 128;

const MILLER_RABIN_ROUNDS: usize = 32;

const SMALL_PRIMES: [u32; 15] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

/// The bank's public parameters `(n, e)`. Anyone holding these can verify coin signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankPublicKey {
    n: BigUint,
    e: BigUint,
}

impl BankPublicKey {
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn exponent(&self) -> &BigUint {
        &self.e
    }
}

/// The bank's signing exponent. Never leaves the bank process.
#[derive(Clone, PartialEq, Eq)]
pub struct BankSecretKey {
    d: BigUint,
}

impl Debug for BankSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BankSecretKey(<redacted>)")
    }
}

/// The bank's RSA keypair, established once at initialisation and immutable for the process
/// lifetime. Sign and verify calls take it (or its public half) explicitly; there is no hidden
/// global key.
#[derive(Debug, Clone)]
pub struct BankKeyPair {
    public: BankPublicKey,
    secret: BankSecretKey,
}

impl BankKeyPair {
    /// Generate a fresh keypair with a modulus of `bits` bits.
    pub fn generate<R: CryptoRng + RngCore>(bits: usize, rng: &mut R) -> Result<Self, KeyError> {
        if bits < MIN_MODULUS_BITS {
            return Err(KeyError::ModulusTooSmall { requested: bits, min: MIN_MODULUS_BITS });
        }
        let e = BigUint::from(PUBLIC_EXPONENT);
        let one = BigUint::from(1u32);
        loop {
            let p = generate_prime(bits / 2, rng);
            let q = generate_prime(bits - bits / 2, rng);
            if p == q {
                continue;
            }
            let n = &p * &q;
            let phi = (&p - &one) * (&q - &one);
            // e must be invertible mod phi; retry with new primes otherwise
            let Some(d) = e.modinv(&phi) else {
                continue;
            };
            debug!("generated {}-bit bank modulus", n.bits());
            return Ok(BankKeyPair { public: BankPublicKey { n, e }, secret: BankSecretKey { d } });
        }
    }

    pub fn public(&self) -> &BankPublicKey {
        &self.public
    }

    pub(crate) fn signing_exponent(&self) -> &BigUint {
        &self.secret.d
    }

    pub(crate) fn modulus(&self) -> &BigUint {
        &self.public.n
    }
}

/// Uniform value in `[0, bound)`. Rejection sampling over the bound's bit length.
pub(crate) fn random_below<R: CryptoRng + RngCore>(bound: &BigUint, rng: &mut R) -> BigUint {
    let bits = bound.bits() as usize;
    let bytes = bits.div_ceil(8);
    let excess_bits = (bytes * 8 - bits) as u32;
    loop {
        let mut buf = vec![0u8; bytes];
        rng.fill_bytes(&mut buf);
        buf[0] >>= excess_bits;
        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < bound {
            return candidate;
        }
    }
}

fn generate_prime<R: CryptoRng + RngCore>(bits: usize, rng: &mut R) -> BigUint {
    let bytes = bits.div_ceil(8);
    let excess_bits = (bytes * 8 - bits) as u32;
    loop {
        let mut buf = vec![0u8; bytes];
        rng.fill_bytes(&mut buf);
        buf[0] >>= excess_bits;
        // top two bits set, so the product of two such primes has full bit length
        let top = 7 - excess_bits;
        buf[0] |= 1 << top;
        if top >= 1 {
            buf[0] |= 1 << (top - 1);
        } else {
            buf[1] |= 0x80;
        }
        buf[bytes - 1] |= 1; // odd
        let candidate = BigUint::from_bytes_be(&buf);
        if is_prime(&candidate, rng) {
            return candidate;
        }
    }
}

/// Miller-Rabin with [`MILLER_RABIN_ROUNDS`] random bases, after trial division by the small
/// primes. Probabilistic, with error probability at most `4^-rounds`.
pub(crate) fn is_prime<R: CryptoRng + RngCore>(n: &BigUint, rng: &mut R) -> bool {
    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p) == BigUint::from(0u32) {
            return false;
        }
    }
    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    let base_bound = n - &BigUint::from(3u32);
    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = random_below(&base_bound, rng) + &two; // a in [2, n-2]
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn miller_rabin_agrees_on_known_values() {
        let mut r = rng();
        for p in [2u32, 3, 5, 47, 53, 65537, 2147483647] {
            assert!(is_prime(&BigUint::from(p), &mut r), "{p} is prime");
        }
        for c in [0u32, 1, 4, 49, 65535, 2147483647 - 2] {
            assert!(!is_prime(&BigUint::from(c), &mut r), "{c} is composite");
        }
        // Carmichael numbers, Fermat-pseudoprime to every coprime base
        for c in [561u32, 41041, 825265] {
            assert!(!is_prime(&BigUint::from(c), &mut r), "{c} is a Carmichael number");
        }
        // a Carmichael number whose factors all clear the trial-division sieve: 101*151*251
        assert!(!is_prime(&BigUint::from(3828001u32), &mut r));
    }

    #[test]
    fn generate_produces_working_parameters() {
        let keys = BankKeyPair::generate(128, &mut rng()).unwrap();
        assert_eq!(keys.public().modulus().bits(), 128);
        assert_eq!(keys.public().exponent(), &BigUint::from(PUBLIC_EXPONENT));
        // d inverts e: x^(e*d) == x mod n
        let x = BigUint::from(0xfeed_f00d_u32);
        let signed = x.modpow(keys.signing_exponent(), keys.modulus());
        assert_eq!(signed.modpow(keys.public().exponent(), keys.modulus()), x);
    }

    #[test]
    fn rejects_tiny_modulus() {
        assert_eq!(
            BankKeyPair::generate(64, &mut rng()).unwrap_err(),
            KeyError::ModulusTooSmall { requested: 64, min: MIN_MODULUS_BITS }
        );
    }

    #[test]
    fn random_below_respects_bound() {
        let mut r = rng();
        let bound = BigUint::from(1000u32);
        for _ in 0..200 {
            assert!(random_below(&bound, &mut r) < bound);
        }
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let keys = BankKeyPair::generate(128, &mut rng()).unwrap();
        let rendered = format!("{:?}", keys.secret);
        assert!(!rendered.contains(&keys.signing_exponent().to_string()));
        assert!(rendered.contains("redacted"));
    }
}
