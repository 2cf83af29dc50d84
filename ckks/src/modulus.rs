/// A word prepared for repeated multiplications modulo q: (value, floor(value * 2^64 / q)).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barrett<O>(pub O, pub O);

impl<O> Barrett<O> {
    #[inline(always)]
    pub fn value(&self) -> &O {
        &self.0
    }

    #[inline(always)]
    pub fn quotient(&self) -> &O {
        &self.1
    }
}

pub trait ReduceOnce<O> {
    /// Assigns self-q to self if self >= q.
    /// User must ensure that 2q fits in O.
    fn reduce_once_assign(&mut self, q: O);
    /// Returns self-q if self >= q else self.
    /// User must ensure that 2q fits in O.
    fn reduce_once(&self, q: O) -> O;
}

impl ReduceOnce<u64> for u64 {
    #[inline(always)]
    fn reduce_once_assign(&mut self, q: u64) {
        debug_assert!(q < 0x8000000000000000, "2q >= 2^64");
        *self = (*self).min(self.wrapping_sub(q))
    }

    #[inline(always)]
    fn reduce_once(&self, q: u64) -> u64 {
        debug_assert!(q < 0x8000000000000000, "2q >= 2^64");
        (*self).min(self.wrapping_sub(q))
    }
}

/// Arithmetic modulo a word-sized prime q < 2^62.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulus {
    pub q: u64,
    pub two_q: u64,
}

impl Modulus {
    pub fn new(q: u64) -> Self {
        assert!(
            q > 2 && q < (1 << 62),
            "invalid argument q: q={} must be in (2, 2^62)",
            q
        );
        Self { q, two_q: q << 1 }
    }

    #[inline(always)]
    pub fn q(&self) -> u64 {
        self.q
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        (a + b).reduce_once(self.q)
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        (a + self.q - b).reduce_once(self.q)
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        (self.q - a).reduce_once(self.q)
    }

    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.q as u128) as u64
    }

    #[inline(always)]
    pub fn prepare(&self, v: u64) -> Barrett<u64> {
        debug_assert!(v < self.q, "v={} >= q={}", v, self.q);
        let quotient: u64 = (((v as u128) << 64) / self.q as u128) as _;
        Barrett(v, quotient)
    }

    /// Returns lhs * rhs mod q for any rhs < 2^64.
    #[inline(always)]
    pub fn mul_barrett(&self, lhs: &Barrett<u64>, rhs: u64) -> u64 {
        let t: u64 = ((*lhs.quotient() as u128 * rhs as u128) >> 64) as _;
        let r: u64 = rhs
            .wrapping_mul(*lhs.value())
            .wrapping_sub(self.q.wrapping_mul(t));
        r.reduce_once(self.q)
    }

    /// Returns x^exponent mod q.
    pub fn pow(&self, x: u64, exponent: u64) -> u64 {
        let mut y: u64 = 1;
        let mut x: u64 = x % self.q;
        let mut i: u64 = exponent;
        while i > 0 {
            if i & 1 == 1 {
                y = self.mul(y, x);
            }
            x = self.mul(x, x);
            i >>= 1;
        }
        y
    }

    /// Returns x^-1 mod q. q must be prime.
    pub fn inv(&self, x: u64) -> u64 {
        assert!(x % self.q != 0, "invalid argument x: x=0 mod q has no inverse");
        self.pow(x, self.q - 2)
    }

    /// Returns a primitive nth_root-th root of unity mod q.
    /// nth_root must be a power of two dividing q-1.
    pub fn primitive_nth_root(&self, nth_root: u64) -> u64 {
        assert!(
            nth_root.is_power_of_two(),
            "invalid argument nth_root: nth_root={} is not a power of two",
            nth_root
        );
        assert!(
            (self.q - 1) % nth_root == 0,
            "invalid argument nth_root: nth_root={} does not divide q-1={}",
            nth_root,
            self.q - 1
        );
        // g = x^((q-1)/nth_root) has order nth_root iff g^(nth_root/2) = -1,
        // i.e. iff x is a quadratic non-residue.
        let exponent: u64 = (self.q - 1) / nth_root;
        (2..self.q)
            .map(|x| self.pow(x, exponent))
            .find(|g| self.pow(*g, nth_root >> 1) == self.q - 1)
            .unwrap_or_else(|| unreachable!("a prime modulus always has a non-residue"))
    }

    /// Maps a signed integer to its representative in [0, q).
    #[inline(always)]
    pub fn from_i64(&self, x: i64) -> u64 {
        x.rem_euclid(self.q as i64) as u64
    }

    #[inline(always)]
    pub fn from_i128(&self, x: i128) -> u64 {
        x.rem_euclid(self.q as i128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Q0 as Q;

    #[test]
    fn barrett_matches_u128() {
        let m: Modulus = Modulus::new(Q);
        let a: Barrett<u64> = m.prepare(0x1234_5678_9abc_def0 % Q);
        [0u64, 1, 17, Q - 1, u64::MAX, 0xdead_beef_cafe_babe].iter().for_each(|x| {
            let want: u64 = ((*a.value() as u128 * *x as u128) % Q as u128) as u64;
            assert_eq!(m.mul_barrett(&a, *x), want, "x={}", x);
        });
    }

    #[test]
    fn inverse_and_roots() {
        let m: Modulus = Modulus::new(Q);
        let x: u64 = 123456789;
        assert_eq!(m.mul(x, m.inv(x)), 1);
        let nth_root: u64 = 1 << 14;
        let psi: u64 = m.primitive_nth_root(nth_root);
        assert_eq!(m.pow(psi, nth_root), 1);
        assert_eq!(m.pow(psi, nth_root >> 1), Q - 1);
    }

    #[test]
    fn centered_lift() {
        let m: Modulus = Modulus::new(Q);
        assert_eq!(m.from_i64(-5), Q - 5);
        assert_eq!(m.from_i64(5), 5);
        assert_eq!(m.from_i128(-(1i128 << 100)), m.neg(m.pow(2, 100)));
        assert_eq!(m.sub(3, 5), Q - 2);
        assert_eq!(m.neg(0), 0);
        assert_eq!(m.add(Q - 1, 2), 1);
    }
}
