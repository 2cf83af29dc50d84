use crate::modulus::{Barrett, Modulus, ReduceOnce};
use itertools::izip;

/// Precomputed tables for the negacyclic number theoretic transform over
/// Z_q[X]/(X^n + 1).
///
/// Twiddles are stored as powers of a primitive 2n-th root psi in
/// bit-reversed order, so that the forward transform maps coefficients to
/// evaluations in bit-reversed order and the backward transform undoes it.
pub struct Table {
    modulus: Modulus,
    n: usize,
    psi: u64,
    psi_forward_rev: Vec<Barrett<u64>>,
    psi_backward_rev: Vec<Barrett<u64>>,
    n_inv: Barrett<u64>,
}

fn reverse_bits_msb(i: usize, log_n: u32) -> usize {
    if log_n == 0 {
        return 0;
    }
    i.reverse_bits() >> (usize::BITS - log_n)
}

impl Table {
    pub fn new(modulus: Modulus, n: usize) -> Table {
        assert!(
            n.is_power_of_two() && n >= 2,
            "invalid argument n: n={} is not a power of two >= 2",
            n
        );

        let nth_root: u64 = (n as u64) << 1;
        let psi: u64 = modulus.primitive_nth_root(nth_root);
        let psi_inv: u64 = modulus.inv(psi);

        let log_n: u32 = n.trailing_zeros();

        let mut psi_forward_rev: Vec<Barrett<u64>> = vec![Barrett(0, 0); n];
        let mut psi_backward_rev: Vec<Barrett<u64>> = vec![Barrett(0, 0); n];

        let mut powers_forward: u64 = 1u64;
        let mut powers_backward: u64 = 1u64;

        for i in 0..n {
            let i_rev: usize = reverse_bits_msb(i, log_n);
            psi_forward_rev[i_rev] = modulus.prepare(powers_forward);
            psi_backward_rev[i_rev] = modulus.prepare(powers_backward);
            powers_forward = modulus.mul(powers_forward, psi);
            powers_backward = modulus.mul(powers_backward, psi_inv);
        }

        let n_inv: Barrett<u64> = modulus.prepare(modulus.inv(n as u64));

        Self {
            modulus,
            n,
            psi,
            psi_forward_rev,
            psi_backward_rev,
            n_inv,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn psi(&self) -> u64 {
        self.psi
    }

    /// Cooley-Tukey decimation in time, natural order in, bit-reversed out.
    pub fn forward_inplace(&self, a: &mut [u64]) {
        assert!(
            a.len() == self.n,
            "invalid a.len()={} != n={}",
            a.len(),
            self.n
        );
        let log_n: u32 = self.n.trailing_zeros();
        for layer in 0..log_n {
            let (m, size) = (1usize << layer, self.n >> (layer + 1));
            izip!(
                a.chunks_exact_mut(size << 1),
                &self.psi_forward_rev[m..m << 1]
            )
            .for_each(|(a, psi)| {
                let (a, b) = a.split_at_mut(size);
                izip!(a, b).for_each(|(a, b)| self.dit_inplace(a, b, psi));
            });
        }
    }

    /// Gentleman-Sande decimation in frequency, bit-reversed in, natural order out.
    pub fn backward_inplace(&self, a: &mut [u64]) {
        assert!(
            a.len() == self.n,
            "invalid a.len()={} != n={}",
            a.len(),
            self.n
        );
        let log_n: u32 = self.n.trailing_zeros();
        for layer in (0..log_n).rev() {
            let (m, size) = (1usize << layer, self.n >> (layer + 1));
            izip!(
                a.chunks_exact_mut(size << 1),
                &self.psi_backward_rev[m..m << 1]
            )
            .for_each(|(a, psi)| {
                let (a, b) = a.split_at_mut(size);
                izip!(a, b).for_each(|(a, b)| self.dif_inplace(a, b, psi));
            });
        }
        a.iter_mut()
            .for_each(|x| *x = self.modulus.mul_barrett(&self.n_inv, *x));
    }

    #[inline(always)]
    fn dit_inplace(&self, a: &mut u64, b: &mut u64, t: &Barrett<u64>) {
        debug_assert!(*a < self.modulus.q, "a:{} q:{}", a, self.modulus.q);
        debug_assert!(*b < self.modulus.q, "b:{} q:{}", b, self.modulus.q);
        let bt: u64 = self.modulus.mul_barrett(t, *b);
        *b = (*a + self.modulus.q - bt).reduce_once(self.modulus.q);
        *a = (*a + bt).reduce_once(self.modulus.q);
    }

    #[inline(always)]
    fn dif_inplace(&self, a: &mut u64, b: &mut u64, t: &Barrett<u64>) {
        debug_assert!(*a < self.modulus.q, "a:{} q:{}", a, self.modulus.q);
        debug_assert!(*b < self.modulus.q, "b:{} q:{}", b, self.modulus.q);
        let d: u64 = self
            .modulus
            .mul_barrett(t, *a + self.modulus.two_q - *b);
        *a = (*a + *b).reduce_once(self.modulus.q);
        *b = d;
    }
}
