use itertools::izip;

use crate::modulus::Modulus;
use crate::poly::{Poly, PolyRNS};
use crate::ring::Ring;
use sampling::source::Source;

/// The ring Z_Q[X]/(X^n + 1) for Q = q_0 * q_1 * ... < 2^127, one [Ring]
/// per prime.
pub struct RingRNS {
    rings: Vec<Ring>,
    modulus: u128,
    /// (q_0 * ... * q_(i-1), (q_0 * ... * q_(i-1))^-1 mod q_i) for i >= 1.
    garner: Vec<(u128, u64)>,
}

impl RingRNS {
    pub fn new(log_n: usize, moduli: &[u64]) -> Self {
        assert!(!moduli.is_empty(), "invalid argument moduli: moduli is empty");
        let log_q: u32 = moduli.iter().map(|q| u64::BITS - q.leading_zeros()).sum();
        assert!(
            log_q < u128::BITS,
            "invalid argument moduli: product of {} bits does not fit a u128",
            log_q
        );
        let rings: Vec<Ring> = moduli.iter().map(|q| Ring::new(log_n, *q)).collect();

        let mut prod: u128 = moduli[0] as u128;
        let garner: Vec<(u128, u64)> = rings[1..]
            .iter()
            .map(|ring| {
                let m: &Modulus = ring.modulus();
                let inv: u64 = m.inv((prod % m.q() as u128) as u64);
                let entry: (u128, u64) = (prod, inv);
                prod *= m.q() as u128;
                entry
            })
            .collect();

        Self {
            rings,
            modulus: prod,
            garner,
        }
    }

    pub fn n(&self) -> usize {
        self.rings[0].n()
    }

    pub fn log_n(&self) -> usize {
        self.rings[0].log_n()
    }

    pub fn cyclotomic_order(&self) -> usize {
        self.rings[0].cyclotomic_order()
    }

    /// Number of primes.
    pub fn primes(&self) -> usize {
        self.rings.len()
    }

    pub fn at(&self, i: usize) -> &Ring {
        &self.rings[i]
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Q as a u128.
    pub fn modulus(&self) -> u128 {
        self.modulus
    }

    /// Bit size of Q.
    pub fn log_modulus(&self) -> usize {
        (u128::BITS - self.modulus.leading_zeros()) as usize
    }

    pub fn new_polyrns(&self) -> PolyRNS {
        PolyRNS::new(self.n(), self.primes())
    }

    pub fn ntt_inplace(&self, a: &mut PolyRNS) {
        izip!(&self.rings, &mut a.0).for_each(|(ring, a)| ring.ntt_inplace(a));
    }

    pub fn intt_inplace(&self, a: &mut PolyRNS) {
        izip!(&self.rings, &mut a.0).for_each(|(ring, a)| ring.intt_inplace(a));
    }

    pub fn ntt(&self, a: &PolyRNS) -> PolyRNS {
        let mut b: PolyRNS = a.clone();
        self.ntt_inplace(&mut b);
        b
    }

    /// b <- a + b
    pub fn a_add_b_into_b(&self, a: &PolyRNS, b: &mut PolyRNS) {
        izip!(&self.rings, &a.0, &mut b.0).for_each(|(ring, a, b)| ring.a_add_b_into_b(a, b));
    }

    /// c <- a - b
    pub fn a_sub_b_into_c(&self, a: &PolyRNS, b: &PolyRNS, c: &mut PolyRNS) {
        izip!(&self.rings, &a.0, &b.0, &mut c.0)
            .for_each(|(ring, a, b, c)| ring.a_sub_b_into_c(a, b, c));
    }

    /// c <- a * b, NTT domain.
    pub fn a_mul_b_into_c(&self, a: &PolyRNS, b: &PolyRNS, c: &mut PolyRNS) {
        izip!(&self.rings, &a.0, &b.0, &mut c.0)
            .for_each(|(ring, a, b, c)| ring.a_mul_b_into_c(a, b, c));
    }

    /// c <- c + a * b, NTT domain.
    pub fn a_mul_b_add_c_into_c(&self, a: &PolyRNS, b: &PolyRNS, c: &mut PolyRNS) {
        izip!(&self.rings, &a.0, &b.0, &mut c.0)
            .for_each(|(ring, a, b, c)| ring.a_mul_b_add_c_into_c(a, b, c));
    }

    /// Returns a * b with a and b in the coefficient domain.
    pub fn mul(&self, a: &PolyRNS, b: &PolyRNS) -> PolyRNS {
        PolyRNS(
            izip!(&self.rings, &a.0, &b.0)
                .map(|(ring, a, b)| ring.mul(a, b))
                .collect(),
        )
    }

    pub fn from_i64(&self, coeffs: &[i64], a: &mut PolyRNS) {
        izip!(&self.rings, &mut a.0).for_each(|(ring, a)| ring.from_i64(coeffs, a));
    }

    pub fn from_i128(&self, coeffs: &[i128], a: &mut PolyRNS) {
        assert!(
            coeffs.len() <= self.n(),
            "invalid coeffs: coeffs.len()={} > n={}",
            coeffs.len(),
            self.n()
        );
        izip!(&self.rings, &mut a.0).for_each(|(ring, a)| {
            let m: &Modulus = ring.modulus();
            a.zero();
            izip!(coeffs, &mut a.0).for_each(|(c, a)| *a = m.from_i128(*c));
        });
    }

    /// Returns the centered representatives in (-Q/2, Q/2] of the
    /// coefficients of a, reconstructed with Garner's algorithm.
    pub fn to_centered_f64(&self, a: &PolyRNS) -> Vec<f64> {
        assert!(
            a.primes() == self.primes(),
            "invalid argument a: a.primes()={} != primes={}",
            a.primes(),
            self.primes()
        );
        let half: u128 = self.modulus >> 1;
        (0..self.n())
            .map(|j| {
                let mut x: u128 = a.at(0).at(j) as u128;
                izip!(&self.rings[1..], &a.0[1..], &self.garner).for_each(|(ring, ai, (prod, inv))| {
                    let m: &Modulus = ring.modulus();
                    let t: u64 = m.sub(ai.at(j), (x % m.q() as u128) as u64);
                    x += m.mul(t, *inv) as u128 * prod;
                });
                if x > half {
                    -((self.modulus - x) as f64)
                } else {
                    x as f64
                }
            })
            .collect()
    }

    /// Total number of gadget digits of an element mod Q: every residue is
    /// split into its own base 2^log_base2k digits.
    pub fn gadget_rows(&self, log_base2k: usize) -> usize {
        self.rings
            .iter()
            .map(|ring| ring.decomposition_digits(log_base2k))
            .sum()
    }

    /// Digits of a (coefficient domain), prime by prime, least significant
    /// first. Every digit is below 2^log_base2k and is lifted to all primes,
    /// so that a = sum_(i,k) digit_(i,k) * 2^(k*log_base2k) * e_i with e_i
    /// the CRT idempotent of q_i.
    pub fn decompose(&self, a: &PolyRNS, log_base2k: usize) -> Vec<PolyRNS> {
        izip!(&self.rings, &a.0)
            .flat_map(|(ring, ai)| ring.decompose(ai, log_base2k))
            .map(|digit: Poly| PolyRNS(vec![digit; self.primes()]))
            .collect()
    }

    /// b <- a(X^gal_el), a and b in the coefficient domain.
    pub fn a_apply_automorphism_into_b(&self, a: &PolyRNS, gal_el: usize, b: &mut PolyRNS) {
        izip!(&self.rings, &a.0, &mut b.0)
            .for_each(|(ring, a, b)| ring.a_apply_automorphism_into_b(a, gal_el, b));
    }

    pub fn galois_element(&self, k: i64) -> usize {
        self.rings[0].galois_element(k)
    }

    pub fn galois_element_conjugate(&self) -> usize {
        self.rings[0].galois_element_conjugate()
    }

    /// a <- uniform in Z_Q, residue by residue.
    pub fn fill_uniform(&self, source: &mut Source, a: &mut PolyRNS) {
        izip!(&self.rings, &mut a.0)
            .for_each(|(ring, a)| source.fill_uniform_mod(ring.modulus().q(), &mut a.0));
    }
}
