pub mod dtype;
pub mod error;
pub mod random;
pub mod tensor;
