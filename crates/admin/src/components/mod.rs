//! Reusable UI component configuration.

pub mod data_table;
