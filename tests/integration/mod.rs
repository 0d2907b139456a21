//! Integration tests for a2a-stage
//!
//! Drive the built binary end to end: catalog browsing, playback, scrubbing,
//! step editing and exit codes.

mod cli_tests;
