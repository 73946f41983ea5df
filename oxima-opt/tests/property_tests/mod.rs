//! Property-based tests for the optimization engine building blocks.

mod cardinality_properties;
mod inf_eps_properties;
