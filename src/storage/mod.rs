//! Vector storage for smokecheck.
//!
//! [`VectorStore`] is the seam to whatever ANN index a deployment uses;
//! [`InMemoryVectorStore`] is the bundled brute-force backend.

mod memory;
mod traits;

pub use memory::InMemoryVectorStore;
pub use traits::{Candidate, RecordId, StorageError, VectorMetadata, VectorStore};
