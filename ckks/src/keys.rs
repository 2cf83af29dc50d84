use fnv::FnvHashMap;
use itertools::izip;

use crate::modulus::{Barrett, Modulus};
use crate::parameters::{Parameters, SIX_SIGMA};
use crate::poly::PolyRNS;
use crate::ring::Ring;
use crate::ring_rns::RingRNS;
use sampling::Distribution;
use sampling::source::Source;

/// Ternary secret, stored reduced mod Q in the coefficient domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretKey(pub PolyRNS);

impl SecretKey {
    pub fn new(n: usize, primes: usize) -> Self {
        SecretKey(PolyRNS::new(n, primes))
    }

    pub fn fill_ternary_hw(&mut self, ring: &RingRNS, hw: usize, source: &mut Source) {
        let mut coeffs: Vec<i64> = vec![0; self.0.n()];
        source.fill_ternary_hw(hw, &mut coeffs);
        ring.from_i64(&coeffs, &mut self.0);
    }

    /// Returns the secret in the NTT domain.
    pub fn prepare(&self, ring: &RingRNS) -> PolyRNS {
        ring.ntt(&self.0)
    }
}

/// Encryption of zero (b, a) = (-a*s + e, a), NTT domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub b: PolyRNS,
    pub a: PolyRNS,
}

impl PublicKey {
    pub fn new(n: usize, primes: usize) -> Self {
        Self {
            b: PolyRNS::new(n, primes),
            a: PolyRNS::new(n, primes),
        }
    }
}

/// Gadget encryption of s_in under s_out, NTT domain. Row (i, k), stored at
/// index i * digits + k, is (-a*s_out + e + 2^(k*log_base2k)*e_i*s_in, a)
/// where e_i is 1 mod q_i and 0 mod the other primes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchingKey {
    pub log_base2k: usize,
    pub rows: Vec<[PolyRNS; 2]>,
}

impl SwitchingKey {
    pub fn new(n: usize, primes: usize, log_base2k: usize, rows: usize) -> Self {
        Self {
            log_base2k,
            rows: (0..rows)
                .map(|_| [PolyRNS::new(n, primes), PolyRNS::new(n, primes)])
                .collect(),
        }
    }

    pub fn n(&self) -> usize {
        self.rows.first().map(|row| row[0].n()).unwrap_or(0)
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Fills the key with an encryption of sk_in (coefficient domain) under
    /// the NTT-domain secret sk_out.
    pub fn generate(
        &mut self,
        params: &Parameters,
        sk_in: &PolyRNS,
        sk_out: &PolyRNS,
        source_xa: &mut Source,
        source_xe: &mut Source,
    ) {
        let ring: &RingRNS = params.ring();
        let sk_in_ntt: PolyRNS = ring.ntt(sk_in);
        let log_base2k: usize = self.log_base2k;
        let mut e: PolyRNS = ring.new_polyrns();
        let mut tmp: PolyRNS = ring.new_polyrns();

        let gadget: Vec<(usize, u64)> = ring
            .rings()
            .iter()
            .enumerate()
            .flat_map(|(i, r)| {
                (0..r.decomposition_digits(log_base2k)).map(move |k| (i, (k * log_base2k) as u64))
            })
            .collect();
        assert_eq!(
            gadget.len(),
            self.rows(),
            "invalid switching key: rows={} != gadget rows={}",
            self.rows(),
            gadget.len()
        );

        izip!(&mut self.rows, gadget).for_each(|([b, a], (i, log_gadget))| {
            ring.fill_uniform(source_xa, a);

            sample_error(params, source_xe, &mut e);
            ring.ntt_inplace(&mut e);

            // b = -a * s_out + e
            ring.a_mul_b_into_c(a, sk_out, &mut tmp);
            ring.a_sub_b_into_c(&e, &tmp, b);

            // b += 2^(k * log_base2k) * s_in mod q_i only
            let r: &Ring = ring.at(i);
            let modulus: &Modulus = r.modulus();
            let factor: Barrett<u64> = modulus.prepare(modulus.pow(2, log_gadget));
            izip!(&mut b.at_mut(i).0, &sk_in_ntt.at(i).0)
                .for_each(|(b, s)| *b = modulus.add(*b, modulus.mul_barrett(&factor, *s)));
        });
    }
}

/// Switching key from s^2 to s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelinearizationKey(pub SwitchingKey);

/// Switching keys from s(X^g) to s, keyed by the Galois element g.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RotationKeySet {
    keys: FnvHashMap<usize, SwitchingKey>,
}

impl RotationKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gal_el: usize, key: SwitchingKey) {
        self.keys.insert(gal_el, key);
    }

    pub fn get(&self, gal_el: usize) -> Option<&SwitchingKey> {
        self.keys.get(&gal_el)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Galois elements in increasing order.
    pub fn galois_elements(&self) -> Vec<usize> {
        let mut gal_els: Vec<usize> = self.keys.keys().copied().collect();
        gal_els.sort_unstable();
        gal_els
    }
}

/// a <- discrete Gaussian error of standard deviation xe, coefficient domain.
pub(crate) fn sample_error(params: &Parameters, source: &mut Source, a: &mut PolyRNS) {
    let mut coeffs: Vec<i64> = vec![0; params.n()];
    Distribution::Normal {
        sigma: params.xe(),
        bound: SIX_SIGMA * params.xe(),
    }
    .fill(source, &mut coeffs);
    params.ring().from_i64(&coeffs, a);
}
