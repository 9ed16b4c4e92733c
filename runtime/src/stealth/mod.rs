//! Stealth measures for the stealth browser profile.
//!
//! Patches browser fingerprint signals and adds a human-like pause after
//! navigation. None of this is a robust bot-detection bypass.

pub mod behavior;
pub mod fingerprint;
