//! Turns a photographed product label into a sustainability verdict.
//!
//! The pipeline runs strictly downward: raw image bytes are decoded into a
//! barcode payload ([`decoder`]), the payload is resolved against a product
//! catalog ([`catalog`]), the product's attributes are condensed into a
//! bounded EcoScore ([`scoring`]), and the score drives curated alternatives
//! and tips ([`recommend`]). The [`scan`] module sequences these steps and
//! [`analytics`] keeps a best-effort record of every scan.

#![forbid(unsafe_code)]

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod error;
pub mod recommend;
pub mod scan;
pub mod scoring;
pub mod telemetry;
