//! # latch-rules
//!
//! Pluggable validation rule engine for latch.
//!
//! This crate provides:
//! - The [`RuleRegistry`] type -> executor dispatch table
//! - The five built-in executors: pattern match, sandboxed script,
//!   external predicate call, store-backed predicate, boolean combinator
//! - The [`ScriptRuntime`] and [`HttpCaller`] capability traits
//! - Helper predicates for script runtimes (CPF/CNPJ, email, dates)

pub mod context;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod registry;

pub use context::RuleContext;
pub use error::RuleError;
pub use executor::composite::CompositeExecutor;
pub use executor::http::{HttpCallExecutor, HttpCaller, HttpRequest, HttpResponse, ReqwestCaller};
pub use executor::pattern::PatternExecutor;
pub use executor::query::QueryExecutor;
pub use executor::script::{ScriptExecutor, ScriptRuntime};
pub use registry::{
    RuleExecutor, RuleRegistry, RULE_TYPE_COMPOSITE, RULE_TYPE_EXTERNAL_CALL, RULE_TYPE_PATTERN,
    RULE_TYPE_SCRIPT, RULE_TYPE_STORE_QUERY,
};
