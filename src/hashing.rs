//! This module provides deterministic `HashMap` and `HashSet` variants. The hashing data
//! structures in the standard library are not deterministic:
//!
//! > By default, HashMap uses a hashing algorithm selected to provide
//! > resistance against HashDoS attacks. The algorithm is randomly seeded, and a
//! > reasonable best-effort is made to generate this seed from a high quality,
//! > secure source of randomness provided by the host without blocking the program.
//!
//! A simulation must replay identically under a fixed seed, so any map whose iteration order
//! can reach the random number stream has to use a fixed hasher. Use `HashMap::default()` to
//! create a new map.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
