use log::debug;

use crate::backend::SlotEncryptor;
use crate::error::{PrsError, Result};
use crate::packing::pack_matrix;
use crate::shape::MatrixShape;

/// Grid of ciphertexts, rows x blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptedMatrix<C> {
    shape: MatrixShape,
    rows: Vec<Vec<C>>,
}

impl<C> EncryptedMatrix<C> {
    /// Fails unless every row has as many ciphertexts as the first.
    pub fn from_rows(rows: Vec<Vec<C>>) -> Result<Self> {
        let blocks: usize = rows.first().map(|row| row.len()).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != blocks) {
            return Err(PrsError::ShapeMismatch(format!(
                "row {} has {} ciphertexts but row 0 has {}",
                i,
                row.len(),
                blocks
            )));
        }
        Ok(Self {
            shape: MatrixShape::new(rows.len(), blocks),
            rows,
        })
    }

    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    pub fn row(&self, i: usize) -> &[C] {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[Vec<C>] {
        &self.rows
    }

    pub fn at(&self, i: usize, j: usize) -> &C {
        &self.rows[i][j]
    }

    /// Ciphertexts in row-major, block-minor order.
    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.rows.iter().flatten()
    }

    pub fn into_rows(self) -> Vec<Vec<C>> {
        self.rows
    }
}

/// Packs every row of a dense matrix into blocks of slots and encrypts them.
pub fn encrypt_matrix<C, E: SlotEncryptor<C>>(
    encryptor: &mut E,
    rows: &[Vec<f64>],
) -> Result<EncryptedMatrix<C>> {
    let (shape, packed) = pack_matrix(rows, encryptor.slots())?;
    debug!("encrypting {} ciphertexts ({})", shape.len(), shape);
    let rows: Vec<Vec<C>> = packed
        .iter()
        .map(|blocks| {
            blocks
                .iter()
                .map(|block| encryptor.encrypt_slots(block))
                .collect::<Result<Vec<C>>>()
        })
        .collect::<Result<_>>()?;
    Ok(EncryptedMatrix { shape, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_checks_uniformity() {
        let m: EncryptedMatrix<u8> = EncryptedMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m.shape(), MatrixShape::new(2, 2));
        assert_eq!(m.iter().copied().collect::<Vec<u8>>(), vec![1, 2, 3, 4]);
        assert_eq!(*m.at(1, 0), 3);

        assert!(matches!(
            EncryptedMatrix::from_rows(vec![vec![1u8, 2], vec![3]]),
            Err(PrsError::ShapeMismatch(_))
        ));
    }
}
