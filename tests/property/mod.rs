//! Property-based tests for session derivation
