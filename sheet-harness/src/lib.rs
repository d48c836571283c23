//! Conversation test harness for a spreadsheet assistant: a chat-completion
//! model drives an in-memory workbook through tool calls, and each scenario
//! reports how the loop ended.

pub mod address;
pub mod agent;
pub mod ai;
pub mod config;
pub mod error;
pub mod models;
pub mod scenarios;
pub mod tools;
pub mod workbook;

pub use error::{HarnessError, Result};
