//! Lead capture for the Squamish neighbourhood guide.
//!
//! Phone verification over SMS, CRM hand-off, and access-link emails behind a
//! single action-dispatched HTTP endpoint.

pub mod config;
pub mod error;
pub mod leads;
pub mod telemetry;
