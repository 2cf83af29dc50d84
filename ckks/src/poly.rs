/// A polynomial of Z_q[X]/(X^n + 1) stored as its n coefficients in [0, q),
/// or as its n evaluations when in the NTT domain.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Poly(pub Vec<u64>);

impl Poly {
    pub fn new(n: usize) -> Self {
        Self(vec![0u64; n])
    }

    pub fn n(&self) -> usize {
        self.0.len()
    }

    pub fn zero(&mut self) {
        self.0.fill(0)
    }

    pub fn at(&self, i: usize) -> u64 {
        self.0[i]
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

/// A polynomial of Z_Q[X]/(X^n + 1), Q = q_0 * q_1 * ..., stored as its
/// residue polynomials mod every q_i.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PolyRNS(pub Vec<Poly>);

impl PolyRNS {
    pub fn new(n: usize, primes: usize) -> Self {
        Self((0..primes).map(|_| Poly::new(n)).collect())
    }

    pub fn n(&self) -> usize {
        self.0.first().map(|a| a.n()).unwrap_or(0)
    }

    pub fn log_n(&self) -> usize {
        self.n().trailing_zeros() as usize
    }

    /// Number of residues.
    pub fn primes(&self) -> usize {
        self.0.len()
    }

    pub fn at(&self, i: usize) -> &Poly {
        &self.0[i]
    }

    pub fn at_mut(&mut self, i: usize) -> &mut Poly {
        &mut self.0[i]
    }

    pub fn zero(&mut self) {
        self.0.iter_mut().for_each(|a| a.zero())
    }
}
