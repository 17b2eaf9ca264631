//! Credential store implementations.

pub mod memory;

#[cfg(feature = "file-store")]
pub mod file;

#[cfg(feature = "file-store")]
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
