pub mod ciphertext;
pub mod decryptor;
pub mod encoding;
pub mod encryptor;
pub mod error;
pub mod evaluator;
pub mod key_generator;
pub mod keys;
pub mod modulus;
pub mod ntt;
pub mod parameters;
pub mod plaintext;
pub mod poly;
pub mod ring;
pub mod ring_rns;
pub mod serialization;

pub use ciphertext::Ciphertext;
pub use decryptor::Decryptor;
pub use encryptor::Encryptor;
pub use error::{EvalError, ParameterError};
pub use evaluator::Evaluator;
pub use key_generator::{KeyGenerator, inner_sum_rotations};
pub use keys::{PublicKey, RelinearizationKey, RotationKeySet, SecretKey, SwitchingKey};
pub use parameters::{Parameters, ParametersLiteral};
pub use plaintext::Plaintext;
pub use poly::{Poly, PolyRNS};
pub use ring_rns::RingRNS;
pub use serialization::{ReaderFrom, WriterTo};
