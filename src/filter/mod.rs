//! Cascading filter chains.
//!
//! A chain of dependent selectors (e.g. Exam → Grade → Stream → Batch)
//! where changing one node clears and reloads everything downstream.

mod chain;

pub use chain::{FilterChain, FilterError, FilterNode};
