//! Grammar Expander - Deterministic string rewriting
//!
//! Every generation replaces each symbol with its rule, or keeps it when the
//! rule table has no entry (identity rule). No randomness is involved, so the
//! same axiom, rules and depth always produce the same string.

use std::collections::BTreeMap;

use crate::error::{CamoError, Result};
use crate::lsystem::rules::RuleSet;
use crate::turtle::Command;

/// Axiom plus its production rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub axiom: String,
    pub rules: RuleSet,
}

impl Grammar {
    pub fn new(axiom: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            axiom: axiom.into(),
            rules,
        }
    }

    /// Rewrite the axiom `depth` times
    pub fn expand(&self, depth: u32) -> String {
        expand(&self.axiom, &self.rules, depth)
    }

    /// Symbol count of `expand(depth)` without building the string
    pub fn expanded_len(&self, depth: u32) -> u128 {
        expanded_len(&self.axiom, &self.rules, depth)
    }
}

/// Rewrite `axiom` through `depth` generations of `rules`
///
/// Empty replacements are legal: the symbol vanishes from the next generation.
pub fn expand(axiom: &str, rules: &RuleSet, depth: u32) -> String {
    let mut current = axiom.to_string();

    if rules.is_empty() {
        return current;
    }

    for _ in 0..depth {
        // Exact size of the next generation, so large strings allocate once
        let next_len: usize = current
            .chars()
            .map(|c| rules.get(c).map_or(c.len_utf8(), str::len))
            .sum();

        let mut next = String::with_capacity(next_len);
        for c in current.chars() {
            match rules.get(c) {
                Some(replacement) => next.push_str(replacement),
                None => next.push(c),
            }
        }
        current = next;
    }

    current
}

/// Predict the number of symbols produced by `expand`
///
/// Tracks how many copies of each symbol exist per generation instead of the
/// string itself. Saturates at `u128::MAX` for runaway grammars.
pub fn expanded_len(axiom: &str, rules: &RuleSet, depth: u32) -> u128 {
    let mut counts: BTreeMap<char, u128> = BTreeMap::new();
    for c in axiom.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    for _ in 0..depth {
        let mut next: BTreeMap<char, u128> = BTreeMap::new();
        for (&symbol, &n) in &counts {
            match rules.get(symbol) {
                Some(replacement) => {
                    for c in replacement.chars() {
                        let slot = next.entry(c).or_insert(0);
                        *slot = slot.saturating_add(n);
                    }
                }
                None => {
                    let slot = next.entry(symbol).or_insert(0);
                    *slot = slot.saturating_add(n);
                }
            }
        }
        counts = next;

        if counts.is_empty() {
            break;
        }
    }

    counts.values().fold(0u128, |acc, &n| acc.saturating_add(n))
}

/// Verify every branch-close has a matching branch-open and nothing stays open
pub fn check_branches(symbols: &str) -> Result<()> {
    let mut open: usize = 0;

    for (index, c) in symbols.chars().enumerate() {
        match Command::from_symbol(c) {
            Some(Command::BranchOpen) => open += 1,
            Some(Command::BranchClose) => {
                if open == 0 {
                    return Err(CamoError::grammar(format!(
                        "branch-close at symbol {} has no matching branch-open",
                        index
                    )));
                }
                open -= 1;
            }
            _ => {}
        }
    }

    if open > 0 {
        return Err(CamoError::grammar(format!(
            "{} branch-open(s) never closed",
            open
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bush() -> RuleSet {
        RuleSet::parse("F -> FF+[+F-F-F]-[-F+F+F]").unwrap()
    }

    #[test]
    fn test_depth_zero_is_axiom() {
        assert_eq!(expand("F+F", &bush(), 0), "F+F");
        assert_eq!(expand("", &bush(), 4), "");
    }

    #[test]
    fn test_depth_one_bush() {
        assert_eq!(expand("F", &bush(), 1), "FF+[+F-F-F]-[-F+F+F]");
    }

    #[test]
    fn test_unmapped_symbols_are_identity() {
        let rules = RuleSet::parse("A -> AB").unwrap();
        let out = expand("X[A]Y", &rules, 3);
        assert_eq!(out, "X[ABBB]Y");
        assert!(out.starts_with('X') && out.ends_with("]Y"));
    }

    #[test]
    fn test_empty_replacement_vanishes() {
        let rules = RuleSet::parse("G ->; F -> FG").unwrap();
        assert_eq!(expand("F", &rules, 1), "FG");
        assert_eq!(expand("F", &rules, 2), "FG");
        assert_eq!(expand("GGG", &rules, 1), "");
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let grammar = Grammar::new("F", bush());
        assert_eq!(grammar.expand(3), grammar.expand(3));
    }

    #[test]
    fn test_growth() {
        let grammar = Grammar::new("F", bush());
        let d2 = grammar.expand(2);
        let d3 = grammar.expand(3);
        assert!(d3.len() > d2.len());
    }

    #[test]
    fn test_predicted_length_matches() {
        let grammar = Grammar::new("F", bush());
        for depth in 0..5 {
            assert_eq!(
                grammar.expanded_len(depth),
                grammar.expand(depth).chars().count() as u128
            );
        }

        let dragon = Grammar::new("F", RuleSet::parse("F -> F+G; G -> F-G").unwrap());
        assert_eq!(dragon.expanded_len(6), dragon.expand(6).len() as u128);
    }

    #[test]
    fn test_predicted_length_saturates() {
        let doubling = RuleSet::parse("F -> FF").unwrap();
        assert_eq!(expanded_len("F", &doubling, 10), 1024);
        assert_eq!(expanded_len("F", &doubling, 500), u128::MAX);
    }

    #[test]
    fn test_branch_balance() {
        assert!(check_branches("F[+F][-F[F]]").is_ok());
        assert!(check_branches(&expand("F", &bush(), 3)).is_ok());

        assert!(matches!(
            check_branches("]"),
            Err(CamoError::MalformedGrammar(_))
        ));
        assert!(matches!(
            check_branches("F[F]]["),
            Err(CamoError::MalformedGrammar(_))
        ));
        assert!(matches!(
            check_branches("[[F]"),
            Err(CamoError::MalformedGrammar(_))
        ));
    }
}
