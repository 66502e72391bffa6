//! L-System - Grammar expansion and rule notation
//!
//! - grammar: axiom rewriting, length prediction, branch balance checks
//! - rules: `symbol -> replacement` tables parsed from text or config maps

pub mod grammar;
pub mod rules;

pub use grammar::{check_branches, expand, expanded_len, Grammar};
pub use rules::{RuleSet, RulesSpec};
