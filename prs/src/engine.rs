use std::time::Instant;

use itertools::izip;
use log::{debug, info};
use rayon::prelude::*;

use crate::backend::SlotEvaluator;
use crate::error::{PrsError, Result};
use crate::matrix::EncryptedMatrix;
use crate::shape::MatrixShape;

/// Returns a ciphertext whose slot 0 holds the inner product of the vectors
/// packed in lhs and rhs.
///
/// The blocks are multiplied pairwise, summed in block order, then summed
/// across slots by adding the ciphertext rotated by 1, 2, ..., slots/2.
pub fn inner_product<C, E: SlotEvaluator<C>>(
    evaluator: &E,
    lhs: &[C],
    rhs: &[C],
    slots: usize,
) -> Result<C> {
    assert!(
        slots.is_power_of_two(),
        "invalid argument slots: slots={} is not a power of two",
        slots
    );
    if lhs.len() != rhs.len() {
        return Err(PrsError::ShapeMismatch(format!(
            "inner product of {} blocks with {} blocks",
            lhs.len(),
            rhs.len()
        )));
    }
    let (first_lhs, first_rhs) = match (lhs.first(), rhs.first()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(PrsError::ShapeMismatch(
                "inner product of empty rows".to_string(),
            ));
        }
    };

    let mut acc: C = evaluator.mul_relin(first_lhs, first_rhs)?;
    for (a, b) in izip!(&lhs[1..], &rhs[1..]) {
        let prod: C = evaluator.mul_relin(a, b)?;
        acc = evaluator.add(&acc, &prod)?;
    }

    for t in 0..slots.trailing_zeros() {
        let rotated: C = evaluator.rotate(&acc, 1 << t)?;
        acc = evaluator.add(&acc, &rotated)?;
    }
    Ok(acc)
}

fn check_operands<C>(coef: &EncryptedMatrix<C>, sample: &EncryptedMatrix<C>) -> Result<MatrixShape> {
    coef.shape().check_blocks(&sample.shape())?;
    if coef.shape().is_empty() || sample.shape().is_empty() {
        return Err(PrsError::ShapeMismatch(format!(
            "empty operand: coefficients {}, samples {}",
            coef.shape(),
            sample.shape()
        )));
    }
    Ok(MatrixShape::new(coef.shape().rows, sample.shape().rows))
}

/// Returns the cross matrix: cell (i, j) holds in slot 0 the inner product
/// of coefficient row i with sample row j.
pub fn dot_product_matrix<C, E: SlotEvaluator<C>>(
    evaluator: &E,
    coef: &EncryptedMatrix<C>,
    sample: &EncryptedMatrix<C>,
    slots: usize,
) -> Result<EncryptedMatrix<C>> {
    let cross: MatrixShape = check_operands(coef, sample)?;
    info!(
        "dot product of coefficients {} with samples {}",
        coef.shape(),
        sample.shape()
    );
    let now: Instant = Instant::now();
    let rows: Vec<Vec<C>> = coef
        .rows()
        .iter()
        .enumerate()
        .map(|(i, coef_row)| {
            debug!("coefficient row {}/{}", i + 1, cross.rows);
            sample
                .rows()
                .iter()
                .map(|sample_row| inner_product(evaluator, coef_row, sample_row, slots))
                .collect::<Result<Vec<C>>>()
        })
        .collect::<Result<_>>()?;
    info!("cross matrix {} in {:?}", cross, now.elapsed());
    EncryptedMatrix::from_rows(rows)
}

/// [dot_product_matrix] with the cells fanned out over the current rayon
/// thread pool. The output order does not depend on the scheduling.
pub fn dot_product_matrix_par<C, E>(
    evaluator: &E,
    coef: &EncryptedMatrix<C>,
    sample: &EncryptedMatrix<C>,
    slots: usize,
) -> Result<EncryptedMatrix<C>>
where
    C: Send + Sync,
    E: SlotEvaluator<C> + Sync,
{
    let cross: MatrixShape = check_operands(coef, sample)?;
    info!(
        "dot product of coefficients {} with samples {} on {} threads",
        coef.shape(),
        sample.shape(),
        rayon::current_num_threads()
    );
    let now: Instant = Instant::now();
    let mut cells: Vec<C> = (0..cross.len())
        .into_par_iter()
        .map(|idx| {
            let (i, j) = (idx / cross.blocks, idx % cross.blocks);
            inner_product(evaluator, coef.row(i), sample.row(j), slots)
        })
        .collect::<Result<Vec<C>>>()?;
    info!("cross matrix {} in {:?}", cross, now.elapsed());

    let mut rows: Vec<Vec<C>> = Vec::with_capacity(cross.rows);
    for _ in 0..cross.rows {
        let rest: Vec<C> = cells.split_off(cross.blocks);
        rows.push(cells);
        cells = rest;
    }
    EncryptedMatrix::from_rows(rows)
}

/// Plaintext reference: dense[s][m] = <coef[m], sample[s]>.
pub fn plain_dot_product_matrix(coef: &[Vec<f64>], sample: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    if let Some((m, s)) = coef
        .iter()
        .enumerate()
        .flat_map(|(m, c)| sample.iter().enumerate().map(move |(s, x)| (m, s, c.len(), x.len())))
        .find(|(_, _, c, x)| c != x)
        .map(|(m, s, _, _)| (m, s))
    {
        return Err(PrsError::ShapeMismatch(format!(
            "coefficient row {} has {} values but sample row {} has {}",
            m,
            coef[m].len(),
            s,
            sample[s].len()
        )));
    }
    Ok(sample
        .iter()
        .map(|x| {
            coef.iter()
                .map(|c| izip!(c, x).map(|(c, x)| c * x).sum::<f64>())
                .collect()
        })
        .collect())
}

/// Largest sum_k |coef[m][k] * sample[s][k]| over all pairs (m, s): a bound
/// on the magnitude of every score and of every partial sum of it.
pub fn max_abs_dot_product(coef: &[Vec<f64>], sample: &[Vec<f64>]) -> f64 {
    coef.iter()
        .flat_map(|c| {
            sample
                .iter()
                .map(move |x| izip!(c, x).map(|(c, x)| (c * x).abs()).sum::<f64>())
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evaluator over cleartext slot vectors.
    struct Clear;

    impl SlotEvaluator<Vec<f64>> for Clear {
        fn mul_relin(&self, a: &Vec<f64>, b: &Vec<f64>) -> Result<Vec<f64>> {
            Ok(izip!(a, b).map(|(a, b)| a * b).collect())
        }

        fn add(&self, a: &Vec<f64>, b: &Vec<f64>) -> Result<Vec<f64>> {
            Ok(izip!(a, b).map(|(a, b)| a + b).collect())
        }

        fn rotate(&self, a: &Vec<f64>, k: i64) -> Result<Vec<f64>> {
            let mut b: Vec<f64> = a.clone();
            b.rotate_left(k as usize % a.len());
            Ok(b)
        }
    }

    fn matrix(rows: &[Vec<f64>], slots: usize) -> EncryptedMatrix<Vec<f64>> {
        let (_, packed) = crate::packing::pack_matrix(rows, slots).unwrap();
        EncryptedMatrix::from_rows(packed).unwrap()
    }

    #[test]
    fn rotate_and_sum_collects_slot_zero() {
        let a: Vec<Vec<f64>> = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        let b: Vec<Vec<f64>> = vec![vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0]];
        let have: Vec<f64> = inner_product(&Clear, matrix(&a, 4).row(0), matrix(&b, 4).row(0), 4).unwrap();
        assert_eq!(have[0], 32.0);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let coef: Vec<Vec<f64>> = vec![vec![1.0, 0.0, 2.0, 1.0, 3.0], vec![0.5, 0.5, 0.5, 0.5, 0.5]];
        let sample: Vec<Vec<f64>> = (0..5)
            .map(|s| (0..5).map(|k| ((s + k) % 3) as f64).collect())
            .collect();
        let c: EncryptedMatrix<Vec<f64>> = matrix(&coef, 4);
        let x: EncryptedMatrix<Vec<f64>> = matrix(&sample, 4);

        let seq: EncryptedMatrix<Vec<f64>> = dot_product_matrix(&Clear, &c, &x, 4).unwrap();
        let par: EncryptedMatrix<Vec<f64>> = dot_product_matrix_par(&Clear, &c, &x, 4).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.shape(), MatrixShape::new(2, 5));

        let want: Vec<Vec<f64>> = plain_dot_product_matrix(&coef, &sample).unwrap();
        (0..2).for_each(|m| (0..5).for_each(|s| assert_eq!(seq.at(m, s)[0], want[s][m])));
    }

    #[test]
    fn block_count_mismatch() {
        let c: EncryptedMatrix<Vec<f64>> = matrix(&[vec![1.0; 5]], 4);
        let x: EncryptedMatrix<Vec<f64>> = matrix(&[vec![1.0; 4]], 4);
        assert!(matches!(
            dot_product_matrix(&Clear, &c, &x, 4),
            Err(PrsError::ShapeMismatch(_))
        ));
        assert!(matches!(
            dot_product_matrix_par(&Clear, &c, &x, 4),
            Err(PrsError::ShapeMismatch(_))
        ));
        assert!(matches!(
            plain_dot_product_matrix(&[vec![1.0; 5]], &[vec![1.0; 4]]),
            Err(PrsError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn magnitude_bound() {
        let coef: Vec<Vec<f64>> = vec![vec![1.0, -1.0], vec![0.5, 0.5]];
        let sample: Vec<Vec<f64>> = vec![vec![2.0, 2.0], vec![-4.0, 1.0]];
        // <coef[0], sample[0]> is 0 but its terms reach 4
        assert_eq!(max_abs_dot_product(&coef, &sample), 5.0);
        assert_eq!(max_abs_dot_product(&[], &sample), 0.0);
    }

    #[test]
    fn plain_reference() {
        let coef: Vec<Vec<f64>> = vec![vec![0.0, 1.0, 0.0, 0.0]];
        let sample: Vec<Vec<f64>> = vec![vec![1.0, 1.0, 0.0, 0.0], vec![2.0, 5.0, 1.0, 1.0]];
        assert_eq!(
            plain_dot_product_matrix(&coef, &sample).unwrap(),
            vec![vec![1.0], vec![5.0]]
        );
    }
}
