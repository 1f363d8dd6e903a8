//! Devote Payments - Masternode payment voting
//!
//! This crate aggregates signed reward-distribution votes cast by
//! masternodes and selects, per block height, the account owed payment by
//! plurality with a minimum-confirmation threshold.

pub mod error;
pub mod payments;
pub mod vote;

pub use error::PaymentsError;
pub use payments::{MasternodeBlockPayees, MasternodePayee, MasternodePayments};
pub use vote::{MasternodeInfo, MasternodePaymentVote, MasternodeRegistry};
