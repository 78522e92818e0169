//! examdesk-core: exam scoring, attempt tracking, and dashboard statistics.
//!
//! The three core modules are [`scoring`], [`attempts`] and [`statistics`].
//! They work over caller-supplied stores ([`store`]) and an injectable
//! [`clock`]; everything else loads fixtures, configuration and reports
//! around them.

pub mod attempts;
pub mod clock;
pub mod config;
pub mod error;
pub mod exams;
pub mod fixture;
pub mod memory;
pub mod model;
pub mod questions;
pub mod report;
pub mod scoring;
pub mod statistics;
pub mod store;
