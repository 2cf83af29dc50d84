use log::info;

use crate::backend::SlotDecryptor;
use crate::error::{PrsError, Result};
use crate::matrix::EncryptedMatrix;
use crate::shape::MatrixShape;

/// Decrypts the cross matrix into dense[sample][model], the transpose of
/// the cross matrix, keeping slot 0 of every cell.
pub fn reconstruct<C, D: SlotDecryptor<C>>(
    decryptor: &D,
    cross: &EncryptedMatrix<C>,
    sample_rows: usize,
    coef_rows: usize,
) -> Result<Vec<Vec<f64>>> {
    reconstruct_with(decryptor, cross, sample_rows, coef_rows, |_, x| x)
}

/// [reconstruct] followed by post(model, value) on every decoded value.
pub fn reconstruct_with<C, D, F>(
    decryptor: &D,
    cross: &EncryptedMatrix<C>,
    sample_rows: usize,
    coef_rows: usize,
    post: F,
) -> Result<Vec<Vec<f64>>>
where
    D: SlotDecryptor<C>,
    F: Fn(usize, f64) -> f64,
{
    let want: MatrixShape = MatrixShape::new(coef_rows, sample_rows);
    if cross.shape() != want {
        return Err(PrsError::ShapeMismatch(format!(
            "cross matrix is {} but {} models x {} samples were expected",
            cross.shape(),
            coef_rows,
            sample_rows
        )));
    }

    let mut dense: Vec<Vec<f64>> = vec![vec![0.0; coef_rows]; sample_rows];
    for (m, row) in cross.rows().iter().enumerate() {
        for (s, ct) in row.iter().enumerate() {
            let slot0: f64 = decryptor.decrypt_slots(ct).first().copied().unwrap_or(0.0);
            dense[s][m] = post(m, slot0);
        }
    }
    info!("reconstructed {} samples x {} models", sample_rows, coef_rows);
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clear;

    impl SlotDecryptor<Vec<f64>> for Clear {
        fn decrypt_slots(&self, ct: &Vec<f64>) -> Vec<f64> {
            ct.clone()
        }
    }

    fn cross() -> EncryptedMatrix<Vec<f64>> {
        // 2 models x 3 samples, slot 0 = 10 * model + sample
        EncryptedMatrix::from_rows(
            (0..2)
                .map(|m| (0..3).map(|s| vec![(10 * m + s) as f64, -1.0]).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn transposes() {
        let dense: Vec<Vec<f64>> = reconstruct(&Clear, &cross(), 3, 2).unwrap();
        assert_eq!(
            dense,
            vec![vec![0.0, 10.0], vec![1.0, 11.0], vec![2.0, 12.0]]
        );
    }

    #[test]
    fn post_processing_hook() {
        let dense: Vec<Vec<f64>> =
            reconstruct_with(&Clear, &cross(), 3, 2, |m, x| x * (m + 1) as f64).unwrap();
        assert_eq!(dense[2], vec![2.0, 24.0]);
    }

    #[test]
    fn shape_is_checked() {
        assert!(matches!(
            reconstruct(&Clear, &cross(), 2, 3),
            Err(PrsError::ShapeMismatch(_))
        ));
    }
}
