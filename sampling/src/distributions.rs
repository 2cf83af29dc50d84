use rand_distr::{Distribution as _, Normal};

use rand_core::RngCore;

use crate::source::Source;

/// Distributions the scheme draws its secrets and errors from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distribution {
    /// Rounded centered gaussian with standard deviation `sigma`, rejected
    /// outside of `[-bound, bound]`.
    Normal { sigma: f64, bound: f64 },
    /// Ternary {-1, 0, 1} with exactly `hw` non-zero entries.
    TernaryHw(usize),
}

impl Distribution {
    /// Fills `a` with signed samples.
    pub fn fill(&self, source: &mut Source, a: &mut [i64]) {
        match *self {
            Distribution::Normal { sigma, bound } => source.fill_normal(sigma, bound, a),
            Distribution::TernaryHw(hw) => source.fill_ternary_hw(hw, a),
        }
    }
}

impl Source {
    /// Fills `a` with rounded gaussian samples of standard deviation `sigma`,
    /// each in [-bound, bound].
    pub fn fill_normal(&mut self, sigma: f64, bound: f64, a: &mut [i64]) {
        assert!(
            sigma > 0.0 && sigma.is_finite(),
            "invalid argument sigma: sigma={} must be finite and positive",
            sigma
        );
        assert!(
            bound >= sigma,
            "invalid argument bound: bound={} < sigma={}",
            bound,
            sigma
        );
        let normal: Normal<f64> = match Normal::new(0.0, sigma) {
            Ok(normal) => normal,
            Err(_) => unreachable!("sigma validated above"),
        };
        a.iter_mut().for_each(|x| {
            let mut v: f64 = normal.sample(self);
            while v.abs() > bound {
                v = normal.sample(self);
            }
            *x = v.round() as i64;
        });
    }

    /// Fills `a` with a ternary vector of exactly `hw` non-zero entries.
    pub fn fill_ternary_hw(&mut self, hw: usize, a: &mut [i64]) {
        assert!(
            hw <= a.len(),
            "invalid argument hw: hw={} > a.len()={}",
            hw,
            a.len()
        );
        a.fill(0);
        // Partial Fisher-Yates over the indexes.
        let mut idx: Vec<usize> = (0..a.len()).collect();
        (0..hw).for_each(|i| {
            let j: usize = i + self.next_index(a.len() - i);
            idx.swap(i, j);
            a[idx[i]] = if self.next_u32() & 1 == 1 { 1 } else { -1 };
        });
    }

    /// Fills `a` with uniform values in [0, q).
    pub fn fill_uniform_mod(&mut self, q: u64, a: &mut [u64]) {
        let mask: u64 = q.next_power_of_two() - 1;
        a.iter_mut().for_each(|x| *x = self.next_u64n(q, mask));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ternary_hw_has_exact_weight() {
        let mut source: Source = Source::new([0u8; 32]);
        let mut a: Vec<i64> = vec![0; 256];
        source.fill_ternary_hw(64, &mut a);
        assert_eq!(a.iter().filter(|x| **x != 0).count(), 64);
        assert!(a.iter().all(|x| (-1..=1).contains(x)));
    }

    #[test]
    fn normal_respects_bound() {
        let mut source: Source = Source::new([5u8; 32]);
        let mut a: Vec<i64> = vec![0; 4096];
        Distribution::Normal {
            sigma: 3.2,
            bound: 19.2,
        }
        .fill(&mut source, &mut a);
        assert!(a.iter().all(|x| x.abs() <= 19));
        let mean: f64 = a.iter().sum::<i64>() as f64 / a.len() as f64;
        assert!(mean.abs() < 0.5, "mean={}", mean);
    }

    #[test]
    fn uniform_mod_below_q() {
        let mut source: Source = Source::new([9u8; 32]);
        let q: u64 = 65537;
        let mut a: Vec<u64> = vec![0; 4096];
        source.fill_uniform_mod(q, &mut a);
        assert!(a.iter().all(|x| *x < q));
    }
}
