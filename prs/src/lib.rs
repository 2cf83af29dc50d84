//! Polygenic risk scores, the dot products of genotype vectors with model
//! coefficient vectors, computed under homomorphic encryption.
//!
//! Vectors are packed into blocks of slots ([packing]), encrypted block by
//! block ([matrix]), written to and read from flat blobs ([codec]), combined
//! into a cross matrix of encrypted inner products ([engine]) and finally
//! decrypted into a dense score matrix ([reconstruct]). The scheme is reached
//! through the traits of [backend].

pub mod backend;
pub mod codec;
pub mod engine;
pub mod error;
pub mod io;
pub mod matrix;
pub mod packing;
pub mod pipeline;
pub mod reconstruct;
pub mod shape;

pub use backend::{CiphertextCodec, SlotDecryptor, SlotEncryptor, SlotEvaluator};
pub use engine::{
    dot_product_matrix, dot_product_matrix_par, inner_product, max_abs_dot_product,
    plain_dot_product_matrix,
};
pub use error::{PrsError, Result};
pub use matrix::{EncryptedMatrix, encrypt_matrix};
pub use packing::{pack, pack_matrix};
pub use reconstruct::{reconstruct, reconstruct_with};
pub use shape::MatrixShape;
