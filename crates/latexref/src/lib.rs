// lib.rs: library surface of the indexer, shared by the binary and tests/.

pub mod backend;
pub mod bibliography;
pub mod candidate;
pub mod completion_context;
pub mod config;
pub mod definition;
pub mod document_store;
pub mod error;
pub mod file_cache;
pub mod labels;
pub mod root;
pub mod scan;
pub mod session;
// Available in test builds and with the `test-support` feature.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
