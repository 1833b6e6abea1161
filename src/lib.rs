#![forbid(unsafe_code)]

pub mod agents;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod project;
pub mod prompts;
pub mod workflow;
