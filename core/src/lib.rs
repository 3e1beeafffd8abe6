pub mod annotation;
pub mod audit;
pub mod comments;
pub mod config;
pub mod determinism;
pub mod eligibility;
pub mod export;
pub mod identity;
pub mod policy;
pub mod service;
pub mod session;
pub mod submission;
pub mod validator;

pub mod error;
