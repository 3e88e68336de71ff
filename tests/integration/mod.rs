//! Integration tests for settings coordination, durability, and the CLI

mod cli_contracts;
mod coordination;
mod durability;
mod support;
