//! Collection aliases used across the crate. Hash maps use the Fx hasher.

pub use std::collections::{BTreeMap, BTreeSet};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
