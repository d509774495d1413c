// test_utils: shared helpers for unit tests and downstream test crates.

pub mod fixture_project;
