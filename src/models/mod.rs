pub mod assemblyai;
pub mod chunk;
pub mod transcript;

pub use assemblyai::*;
pub use chunk::*;
pub use transcript::*;
