//! Integration tests for snaptree

mod batch_semantics;
mod cli_commands;
mod session_publish;
mod sled_store;
mod test_utils;
