//! Weighted pattern scoring.
//!
//! A `PatternTable` is a list of compiled detectors, each carrying a weight
//! and a matching mode. Scoring a text evaluates every entry and sums the
//! weights of those that fire.

use regex::Regex;

/// How a detector contributes its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Adds the weight once if the detector matches at all.
    Presence,
    /// Adds the weight once if the detector matches more than `n` times.
    CountThreshold(usize),
}

/// A single compiled entry of a pattern table.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub detector: Regex,
    pub description: String,
    pub weight: u32,
    pub mode: MatchMode,
}

impl PatternRule {
    fn fires(&self, text: &str) -> bool {
        match self.mode {
            MatchMode::Presence => self.detector.is_match(text),
            MatchMode::CountThreshold(threshold) => {
                self.detector.find_iter(text).count() > threshold
            }
        }
    }
}

/// Result of scoring a text against a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternScore {
    /// Sum of the weights of firing rules, clamped to `[0, 100]`.
    pub score: u8,
    /// Descriptions of the rules that fired, in table order.
    pub matches: Vec<String>,
}

/// An ordered set of weighted detectors.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    /// Compiles a table from `(pattern, description, weight, mode)` tuples.
    ///
    /// # Returns
    /// * `Err` if any pattern fails to compile
    pub fn new(entries: &[(&str, &str, u32, MatchMode)]) -> Result<Self, regex::Error> {
        let rules = entries
            .iter()
            .map(|(pattern, description, weight, mode)| {
                Ok(PatternRule {
                    detector: Regex::new(pattern)?,
                    description: description.to_string(),
                    weight: *weight,
                    mode: *mode,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Returns the number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Scores `text` against every rule of `table`.
pub fn score_patterns(text: &str, table: &PatternTable) -> PatternScore {
    let mut total: u32 = 0;
    let mut matches = Vec::new();

    for rule in &table.rules {
        if rule.fires(text) {
            total = total.saturating_add(rule.weight);
            matches.push(rule.description.clone());
        }
    }

    PatternScore {
        score: total.min(100) as u8,
        matches,
    }
}
