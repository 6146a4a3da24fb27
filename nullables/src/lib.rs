//! Nullable infrastructure for deterministic runs.
//!
//! External dependencies are abstracted behind traits in `agora-types`. This
//! crate provides controllable implementations that return deterministic
//! values and never touch the host environment. Tests and the daemon's
//! script replay swap them in for the real ones.

pub mod clock;

pub use clock::NullClock;
