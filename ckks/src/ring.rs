use crate::modulus::Modulus;
use crate::ntt::Table;
use crate::poly::Poly;
use itertools::izip;

/// The ring Z_q[X]/(X^n + 1) together with its NTT tables.
pub struct Ring {
    n: usize,
    log_n: usize,
    modulus: Modulus,
    table: Table,
}

impl Ring {
    pub fn new(log_n: usize, q: u64) -> Self {
        let n: usize = 1 << log_n;
        let modulus: Modulus = Modulus::new(q);
        Self {
            n,
            log_n,
            modulus,
            table: Table::new(modulus, n),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn log_n(&self) -> usize {
        self.log_n
    }

    /// Order of the cyclotomic group, 2n.
    pub fn cyclotomic_order(&self) -> usize {
        self.n << 1
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    pub fn new_poly(&self) -> Poly {
        Poly::new(self.n)
    }

    pub fn ntt_inplace(&self, a: &mut Poly) {
        self.table.forward_inplace(&mut a.0)
    }

    pub fn intt_inplace(&self, a: &mut Poly) {
        self.table.backward_inplace(&mut a.0)
    }

    pub fn ntt(&self, a: &Poly) -> Poly {
        let mut b: Poly = a.clone();
        self.ntt_inplace(&mut b);
        b
    }

    /// b <- a + b
    pub fn a_add_b_into_b(&self, a: &Poly, b: &mut Poly) {
        debug_assert!(a.n() == self.n, "a.n()={} != n={}", a.n(), self.n);
        debug_assert!(b.n() == self.n, "b.n()={} != n={}", b.n(), self.n);
        izip!(&a.0, &mut b.0).for_each(|(a, b)| *b = self.modulus.add(*a, *b));
    }

    /// c <- a - b
    pub fn a_sub_b_into_c(&self, a: &Poly, b: &Poly, c: &mut Poly) {
        debug_assert!(a.n() == self.n, "a.n()={} != n={}", a.n(), self.n);
        debug_assert!(b.n() == self.n, "b.n()={} != n={}", b.n(), self.n);
        debug_assert!(c.n() == self.n, "c.n()={} != n={}", c.n(), self.n);
        izip!(&a.0, &b.0, &mut c.0).for_each(|(a, b, c)| *c = self.modulus.sub(*a, *b));
    }

    /// a <- -a
    pub fn a_neg_into_a(&self, a: &mut Poly) {
        a.0.iter_mut().for_each(|a| *a = self.modulus.neg(*a));
    }

    /// c <- a * b, pointwise (NTT domain).
    pub fn a_mul_b_into_c(&self, a: &Poly, b: &Poly, c: &mut Poly) {
        debug_assert!(a.n() == self.n, "a.n()={} != n={}", a.n(), self.n);
        debug_assert!(b.n() == self.n, "b.n()={} != n={}", b.n(), self.n);
        debug_assert!(c.n() == self.n, "c.n()={} != n={}", c.n(), self.n);
        izip!(&a.0, &b.0, &mut c.0).for_each(|(a, b, c)| *c = self.modulus.mul(*a, *b));
    }

    /// c <- c + a * b, pointwise (NTT domain).
    pub fn a_mul_b_add_c_into_c(&self, a: &Poly, b: &Poly, c: &mut Poly) {
        debug_assert!(a.n() == self.n, "a.n()={} != n={}", a.n(), self.n);
        debug_assert!(b.n() == self.n, "b.n()={} != n={}", b.n(), self.n);
        debug_assert!(c.n() == self.n, "c.n()={} != n={}", c.n(), self.n);
        izip!(&a.0, &b.0, &mut c.0)
            .for_each(|(a, b, c)| *c = self.modulus.add(*c, self.modulus.mul(*a, *b)));
    }

    /// Returns a * b with a and b in the coefficient domain.
    pub fn mul(&self, a: &Poly, b: &Poly) -> Poly {
        let a_ntt: Poly = self.ntt(a);
        let b_ntt: Poly = self.ntt(b);
        let mut c: Poly = self.new_poly();
        self.a_mul_b_into_c(&a_ntt, &b_ntt, &mut c);
        self.intt_inplace(&mut c);
        c
    }

    /// a <- signed coefficients reduced mod q.
    pub fn from_i64(&self, coeffs: &[i64], a: &mut Poly) {
        assert!(
            coeffs.len() <= self.n,
            "invalid coeffs: coeffs.len()={} > n={}",
            coeffs.len(),
            self.n
        );
        a.zero();
        izip!(coeffs, &mut a.0).for_each(|(c, a)| *a = self.modulus.from_i64(*c));
    }

    /// Number of base 2^log_base2k digits needed to represent a word mod q.
    pub fn decomposition_digits(&self, log_base2k: usize) -> usize {
        let log_q: usize = (u64::BITS - self.modulus.q().leading_zeros()) as usize;
        log_q.div_ceil(log_base2k)
    }

    /// Splits every coefficient of a into its base 2^log_base2k digits,
    /// least significant first: a = sum_i digits[i] * 2^(i * log_base2k).
    pub fn decompose(&self, a: &Poly, log_base2k: usize) -> Vec<Poly> {
        let digits: usize = self.decomposition_digits(log_base2k);
        let mask: u64 = (1u64 << log_base2k) - 1;
        (0..digits)
            .map(|i| {
                let shift: usize = i * log_base2k;
                Poly(a.0.iter().map(|a| (a >> shift) & mask).collect())
            })
            .collect()
    }

    /// b <- a(X^gal_el), a and b in the coefficient domain.
    pub fn a_apply_automorphism_into_b(&self, a: &Poly, gal_el: usize, b: &mut Poly) {
        debug_assert!(a.n() == b.n(), "a.n()={} != b.n()={}", a.n(), b.n());
        assert!(
            gal_el & 1 == 1,
            "invalid gal_el={}: not coprime with nth_root={}",
            gal_el,
            self.cyclotomic_order()
        );
        let mask: usize = self.n - 1;
        let log_n: usize = self.log_n;
        let gal_el: usize = gal_el & (self.cyclotomic_order() - 1);
        a.0.iter().enumerate().for_each(|(i, ai)| {
            let gal_el_i: usize = i * gal_el;
            let sign: usize = (gal_el_i >> log_n) & 1;
            let i_out: usize = gal_el_i & mask;
            b.0[i_out] = if sign == 1 { self.modulus.neg(*ai) } else { *ai };
        });
    }

    /// Galois element X -> X^(5^k) rotating the slots by k positions to the left.
    pub fn galois_element(&self, k: i64) -> usize {
        let order: usize = self.cyclotomic_order();
        let slots: i64 = (self.n >> 1) as i64;
        let k: u64 = k.rem_euclid(slots) as u64;
        let mut gal_el: usize = 1;
        (0..k).for_each(|_| gal_el = (gal_el * 5) & (order - 1));
        gal_el
    }

    /// Galois element of the complex conjugation X -> X^-1.
    pub fn galois_element_conjugate(&self) -> usize {
        self.cyclotomic_order() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Q0 as Q;

    #[test]
    fn decompose_recomposes() {
        let ring: Ring = Ring::new(4, Q);
        let mut a: Poly = ring.new_poly();
        ring.from_i64(&[-1, 2, -3, 1 << 40, 0, 7], &mut a);
        let log_base2k: usize = 17;
        let digits: Vec<Poly> = ring.decompose(&a, log_base2k);
        assert_eq!(digits.len(), 4);
        (0..ring.n()).for_each(|j| {
            let mut acc: u128 = 0;
            digits.iter().enumerate().for_each(|(i, d)| {
                acc += (d.at(j) as u128) << (i * log_base2k);
            });
            assert_eq!(acc as u64, a.at(j));
        });
    }

    #[test]
    fn negation_cancels() {
        let ring: Ring = Ring::new(4, Q);
        let mut a: Poly = ring.new_poly();
        ring.from_i64(&[3, -1, 0, 1 << 50], &mut a);
        let mut b: Poly = a.clone();
        ring.a_neg_into_a(&mut b);
        assert_eq!(b.at(1), 1);
        assert_eq!(b.at(2), 0);
        ring.a_add_b_into_b(&a, &mut b);
        assert_eq!(b, ring.new_poly());
    }

    #[test]
    fn automorphism_conjugate() {
        // X^i -> X^(-i) = -X^(n-i)
        let ring: Ring = Ring::new(4, Q);
        let n: usize = ring.n();
        let a: Poly = Poly((0..n as u64).collect());
        let mut b: Poly = ring.new_poly();
        ring.a_apply_automorphism_into_b(&a, ring.galois_element_conjugate(), &mut b);
        assert_eq!(b.at(0), 0);
        (1..n).for_each(|i| assert_eq!(b.at(i), Q - (n - i) as u64));
    }

    #[test]
    fn automorphism_is_ring_homomorphism() {
        let ring: Ring = Ring::new(5, Q);
        let mut a: Poly = ring.new_poly();
        let mut b: Poly = ring.new_poly();
        ring.from_i64(&[1, -2, 3, 0, 5, -7, 11], &mut a);
        ring.from_i64(&[4, 0, -1, 9], &mut b);
        let gal_el: usize = ring.galois_element(3);
        let ab: Poly = ring.mul(&a, &b);
        let mut ab_auto: Poly = ring.new_poly();
        ring.a_apply_automorphism_into_b(&ab, gal_el, &mut ab_auto);
        let mut a_auto: Poly = ring.new_poly();
        let mut b_auto: Poly = ring.new_poly();
        ring.a_apply_automorphism_into_b(&a, gal_el, &mut a_auto);
        ring.a_apply_automorphism_into_b(&b, gal_el, &mut b_auto);
        assert_eq!(ring.mul(&a_auto, &b_auto), ab_auto);
    }

    #[test]
    fn galois_elements() {
        let ring: Ring = Ring::new(4, Q);
        assert_eq!(ring.galois_element(0), 1);
        assert_eq!(ring.galois_element(1), 5);
        assert_eq!(ring.galois_element(2), 25);
        // 5 has order n/2 = 8 mod 32
        assert_eq!(ring.galois_element(8), 1);
        assert_eq!(ring.galois_element(-1), ring.galois_element(7));
    }
}
