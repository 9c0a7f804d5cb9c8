//! Integration tests for the bbl CLI
//!
//! These tests spawn the actual binary against temporary state directories.
//! None of them reach an IaaS.
