//! Boot sequencer and runtime hash tests

mod boot_tests;
mod hash_tests;
