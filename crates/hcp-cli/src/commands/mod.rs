//! CLI subcommands

pub mod render;
