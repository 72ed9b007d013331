//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against scripted links and recording ports. All tests run on the host
//! with no serial device required.

mod link_worker_tests;
mod mock_link;
