//! Integration tests for the catalog pipeline

mod cli_contracts;
mod persistence;
mod pipeline;
mod support;
