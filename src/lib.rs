//! Health Assist: goal tracking, health records, and a routed multi-specialist
//! conversational assistant.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod goals;
pub mod health;
pub mod llm;
pub mod shell;
pub mod store;
