//! Fingerprint storage for a detection run

pub mod store;

pub use store::FingerprintStore;
