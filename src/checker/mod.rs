//! Reconciliation loop

pub mod checker;

pub use checker::{Checker, CycleReport};
