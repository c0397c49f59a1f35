//! Ruleset configuration for deciding which parts of an install a dedicated
//! server can live without.
//!
//! Rules are read from TOML, one table per rule, in document order:
//!
//! ```toml
//! [rules.textures]
//! type = "extension"
//! extensions = ["dds", "iwi"]
//! verdict = "remove"
//!
//! [rules.binaries]
//! type = "extension"
//! extensions = ["exe", "dll"]
//! verdict = "keep"
//! priority = 100
//! ```
//!
//! An optional `[archive]` section describes which kept files are zip-based
//! asset archives and carries its own `[archive.rules.*]` tables that are
//! applied to the entry names inside those archives.

use crate::error::{PruneError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("default_rules.toml");

/// Outcome of classifying a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Keep,
    Remove,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Keep => "keep",
            Verdict::Remove => "remove",
            Verdict::Unknown => "unknown",
        }
    }

    /// Nothing unclassified is ever deleted.
    pub fn or_keep(self) -> Verdict {
        match self {
            Verdict::Unknown => Verdict::Keep,
            other => other,
        }
    }
}

/// A single classification rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Table name of the rule in the TOML source
    #[serde(default)]
    pub name: String,
    /// What the rule matches against
    #[serde(flatten)]
    pub matcher: Matcher,
    /// Verdict applied when the rule wins
    pub verdict: Verdict,
    /// Higher priority wins over specificity
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Path matchers a rule can use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Matcher {
    /// Whole-component path prefixes relative to the install root
    Prefix { prefixes: Vec<String> },
    /// Glob patterns relative to the install root
    Glob { patterns: Vec<String> },
    /// File name suffixes following a dot, e.g. `dds` or `tar.gz`
    Extension { extensions: Vec<String> },
}

impl Matcher {
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Prefix { .. } => "prefix",
            Matcher::Glob { .. } => "glob",
            Matcher::Extension { .. } => "extension",
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Matcher::Prefix { prefixes } => prefixes,
            Matcher::Glob { patterns } => patterns,
            Matcher::Extension { extensions } => extensions,
        }
    }
}

/// Archive section of a ruleset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveRules {
    /// Extensions of kept files that are treated as zip archives
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Restrict archive rewriting to these prefixes; empty means anywhere
    #[serde(default)]
    pub paths: Vec<String>,
    /// Rules applied to entry names inside the archives
    #[serde(skip)]
    pub rules: Vec<Rule>,
}

/// The full, immutable rule configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    pub rules: Vec<Rule>,
    pub archive: Option<ArchiveRules>,
}

impl Ruleset {
    /// The ruleset compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_RULES)
    }

    /// Load a ruleset from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PruneError::RulesetLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a ruleset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: toml::Value = toml::from_str(toml_str)
            .map_err(|e| PruneError::RulesetLoad(format!("Failed to parse TOML: {}", e)))?;

        let rules = parse_rule_table(config.get("rules"), "rules")?;

        let archive = match config.get("archive") {
            Some(section) => {
                let mut archive: ArchiveRules = section.clone().try_into().map_err(|e| {
                    PruneError::RulesetLoad(format!("Failed to parse archive section: {}", e))
                })?;
                if archive.extensions.is_empty() {
                    return Err(PruneError::RulesetLoad(
                        "archive section needs at least one extension".to_string(),
                    ));
                }
                archive.rules = parse_rule_table(section.get("rules"), "archive.rules")?;
                Some(archive)
            }
            None => None,
        };

        Ok(Ruleset { rules, archive })
    }
}

fn parse_rule_table(value: Option<&toml::Value>, section: &str) -> Result<Vec<Rule>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let table = value
        .as_table()
        .ok_or_else(|| PruneError::RulesetLoad(format!("`{}` must be a table", section)))?;

    let mut rules = Vec::with_capacity(table.len());
    for (name, rule_value) in table {
        let mut rule: Rule = rule_value.clone().try_into().map_err(|e| {
            PruneError::RulesetLoad(format!("Failed to parse rule '{}': {}", name, e))
        })?;
        rule.name = name.clone();
        validate_rule(&rule)?;
        rules.push(rule);
    }
    Ok(rules)
}

fn validate_rule(rule: &Rule) -> Result<()> {
    if rule.verdict == Verdict::Unknown {
        return Err(PruneError::RulesetLoad(format!(
            "Rule '{}' must use verdict \"keep\" or \"remove\"",
            rule.name
        )));
    }
    let values = rule.matcher.values();
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        return Err(PruneError::RulesetLoad(format!(
            "Rule '{}' has an empty {} list or blank entry",
            rule.name,
            rule.matcher.kind()
        )));
    }
    Ok(())
}
