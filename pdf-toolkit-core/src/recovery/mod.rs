//! Recovery of damaged cross-reference data
//!
//! The only repair performed is rebuilding the cross-reference table by a
//! linear scan of the file. Anything the scan cannot fix surfaces as the
//! original parse error.

mod xref_recovery;

pub use xref_recovery::{RecoveryStats, XRefRecovery};
