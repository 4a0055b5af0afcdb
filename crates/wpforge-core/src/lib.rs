//! Core types and configuration for wpforge.
//!
//! This crate defines the `wpforge.toml` schema ([`ProvisionConfig`]),
//! variable resolution from the deployment descriptor ([`resolve_context`]),
//! and the failure taxonomy shared by every stage ([`FailureKind`]).

pub mod config;
pub mod context;
pub mod error;

pub use config::{
    ArtifactConfig, HttpConfig, PermissionConfig, ProvisionConfig, RecipeConfig, RenderConfig,
};
pub use context::{ContextError, Credentials, VariableContext, parse_descriptor, resolve_context};
pub use error::{Error, FailureKind, Result};
