use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PrsError, Result};

/// Grid shape of an encrypted matrix: one row per vector, one column per
/// block of slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixShape {
    pub rows: usize,
    pub blocks: usize,
}

impl MatrixShape {
    pub fn new(rows: usize, blocks: usize) -> Self {
        Self { rows, blocks }
    }

    /// Shape of rows vectors of length len packed into blocks of slots values.
    pub fn for_vectors(rows: usize, len: usize, slots: usize) -> Self {
        assert!(slots > 0, "invalid argument slots: slots=0");
        Self {
            rows,
            blocks: len.div_ceil(slots),
        }
    }

    /// Number of ciphertexts.
    pub fn len(&self) -> usize {
        self.rows * self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails unless self and other have the same number of blocks.
    pub fn check_blocks(&self, other: &MatrixShape) -> Result<()> {
        if self.blocks != other.blocks {
            return Err(PrsError::ShapeMismatch(format!(
                "block counts differ: {} has {} blocks, {} has {}",
                self, self.blocks, other, other.blocks
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_vectors() {
        assert_eq!(MatrixShape::for_vectors(2, 4, 4), MatrixShape::new(2, 1));
        assert_eq!(MatrixShape::for_vectors(3, 5, 4), MatrixShape::new(3, 2));
        assert_eq!(MatrixShape::for_vectors(1, 1, 1024), MatrixShape::new(1, 1));
        assert_eq!(MatrixShape::new(3, 2).len(), 6);
    }

    #[test]
    fn check_blocks() {
        let a: MatrixShape = MatrixShape::new(2, 3);
        assert!(a.check_blocks(&MatrixShape::new(5, 3)).is_ok());
        assert!(matches!(
            a.check_blocks(&MatrixShape::new(2, 2)),
            Err(PrsError::ShapeMismatch(_))
        ));
    }
}
