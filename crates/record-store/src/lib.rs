//! Record store for the reputation backend.
//!
//! Holds three collections:
//! - users, keyed by their unique address
//! - organizations, keyed by assigned id (names are unique)
//! - NFT records, keyed by assigned id (contract/token pairs are unique)
//!
//! Uniqueness is enforced inside the store at insert time, under the same
//! write lock as the existence check.

mod collections;
mod encrypted;
mod error;
mod memory;
mod store;
mod types;

pub use collections::Collections;
pub use encrypted::EncryptedFileStore;
pub use error::{Collection, StoreError};
pub use memory::MemoryStore;
pub use store::RecordStore;
pub use types::*;
