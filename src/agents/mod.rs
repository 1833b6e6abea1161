//! Agent system for the external AI CLIs specpilot shells out to.
//!
//! Agents are described declaratively in TOML and embedded at build time.
//! At runtime a detector probes each one and the manager keeps the
//! resulting snapshot plus the user's selection.
//!
//! # Example
//!
//! ```toml
//! [agent]
//! id = "codegen"
//! name = "CodeGen CLI"
//! command = "codegen"
//! version_flag = "--version"
//! auth_check = ["auth", "status"]
//! login_command = "codegen auth login"
//! auth_heuristic = "status-phrase"
//! capabilities = ["questionnaire", "implementation_plan"]
//!
//! [invocation]
//! style = "code"
//! ```

pub mod auth;
pub mod definition;
pub mod detector;
pub mod manager;
pub mod registry;

pub use definition::{AgentDescriptor, Capability, InvocationStyle};
pub use detector::{AgentDetector, AgentStatus, CommandProbe, ProbeOutput};
pub use manager::{AgentEvent, AgentManager};
pub use registry::AgentRegistry;
