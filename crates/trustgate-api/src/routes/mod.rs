//! # API Route Modules
//!
//! - `service_offers`: issuance, filtered listing, detail and policy
//!   locations of service offerings.

pub mod service_offers;
