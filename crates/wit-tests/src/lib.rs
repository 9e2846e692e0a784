//! Property-based test suite for witkit.
//!
//! Integration tests that exercise wit-core and wit-wallet together under
//! randomized inputs. Shared fixtures live in [`helpers`].

pub mod helpers;
