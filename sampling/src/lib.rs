pub mod distributions;
pub mod source;

pub use distributions::Distribution;
pub use source::{Source, new_seed};
