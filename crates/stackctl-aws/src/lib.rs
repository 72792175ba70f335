//! stackctl-aws
//!
//! CloudFormation-backed implementation of the stack client trait. Kept
//! at the edge: the reconciliation core only ever sees the trait.

pub mod client;
pub mod error;

pub use crate::client::CloudFormationClient;
pub use crate::error::format_err_chain;
