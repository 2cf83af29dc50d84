use crate::error::{PrsError, Result};
use crate::shape::MatrixShape;

/// Splits vector into blocks of exactly slots values, the last block padded
/// with zeros.
pub fn pack(vector: &[f64], slots: usize) -> Result<Vec<Vec<f64>>> {
    assert!(
        slots.is_power_of_two(),
        "invalid argument slots: slots={} is not a power of two",
        slots
    );
    if vector.is_empty() {
        return Err(PrsError::InputMalformed(
            "cannot pack an empty vector".to_string(),
        ));
    }
    Ok(vector
        .chunks(slots)
        .map(|chunk| {
            let mut block: Vec<f64> = vec![0.0; slots];
            block[..chunk.len()].copy_from_slice(chunk);
            block
        })
        .collect())
}

/// Packs every row, which must all have the length of the first one.
pub fn pack_matrix(rows: &[Vec<f64>], slots: usize) -> Result<(MatrixShape, Vec<Vec<Vec<f64>>>)> {
    let first: &Vec<f64> = rows
        .first()
        .ok_or_else(|| PrsError::InputMalformed("cannot pack an empty matrix".to_string()))?;
    let len: usize = first.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != len) {
        return Err(PrsError::InputMalformed(format!(
            "row {} has {} values but row 0 has {}",
            i,
            row.len(),
            len
        )));
    }
    let shape: MatrixShape = MatrixShape::for_vectors(rows.len(), len, slots);
    let packed: Vec<Vec<Vec<f64>>> = rows
        .iter()
        .map(|row| pack(row, slots))
        .collect::<Result<_>>()?;
    Ok((shape, packed))
}
