//! Type discovery and component collection tests

mod collection_tests;
