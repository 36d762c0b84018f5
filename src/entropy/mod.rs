//! Key material for the cipher pipeline
//!
//! Randomness comes from a remote quantum RNG when it answers correctly and
//! from the operating system CSPRNG otherwise. Callers always get the number
//! of bytes they asked for.

pub mod client;
pub mod messages;
pub mod source;

pub use client::{QrngClient, RandomnessService};
pub use messages::{QrngRequest, QrngResponse};
pub use source::{EntropySource, KeyProvenance};
