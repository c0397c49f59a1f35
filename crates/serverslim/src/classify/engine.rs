//! Compiled classifier that maps install-relative paths to verdicts.
//!
//! Matching is case-insensitive and separator-agnostic. When several rules
//! match, the winner is chosen by `(priority, specificity, keep-over-remove)`.
//! Specificity is the component count of the matched prefix, the number of
//! wildcard-free components of a glob, and zero for extension rules. A path
//! no rule matches is kept.

use super::rules::{Matcher, Rule, Verdict};
use crate::error::{PruneError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// The rule that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule: &'a str,
    pub verdict: Verdict,
    pub priority: i32,
    pub specificity: usize,
}

impl RuleMatch<'_> {
    fn rank(&self) -> (i32, usize, bool) {
        (self.priority, self.specificity, self.verdict == Verdict::Keep)
    }
}

#[derive(Debug)]
enum CompiledMatcher {
    Prefix(Vec<Vec<String>>),
    Glob { set: GlobSet, specificity: Vec<usize> },
    Extension(Vec<String>),
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    verdict: Verdict,
    priority: i32,
    matcher: CompiledMatcher,
}

impl CompiledRule {
    fn to_match(&self, specificity: usize) -> RuleMatch<'_> {
        RuleMatch {
            rule: &self.name,
            verdict: self.verdict,
            priority: self.priority,
            specificity,
        }
    }

    fn specificity(&self, normalized: &str, parts: &[&str], is_directory: bool) -> Option<usize> {
        match &self.matcher {
            CompiledMatcher::Prefix(prefixes) => prefix_specificity(prefixes, parts),
            CompiledMatcher::Glob { set, specificity } => set
                .matches(normalized)
                .into_iter()
                .map(|idx| specificity[idx])
                .max(),
            CompiledMatcher::Extension(suffixes) => {
                if is_directory {
                    return None;
                }
                let name = parts.last()?;
                suffixes
                    .iter()
                    .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix.as_str()))
                    .then_some(0)
            }
        }
    }
}

/// Classifier compiled from a fixed list of rules.
#[derive(Debug)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    pub fn new(rules: &[Rule]) -> Result<Self> {
        let rules = rules.iter().map(compile_rule).collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify a path relative to the install root.
    ///
    /// For directories the verdict is advisory: `Remove` means the whole
    /// subtree would classify `Remove` file by file, anything else means the
    /// caller has to descend.
    pub fn classify<P: AsRef<Path>>(&self, path: P, is_directory: bool) -> Verdict {
        self.explain(path, is_directory)
            .map(|m| m.verdict)
            .unwrap_or(Verdict::Keep)
    }

    /// Return the winning rule for a path, if any rule applies.
    pub fn explain<P: AsRef<Path>>(&self, path: P, is_directory: bool) -> Option<RuleMatch<'_>> {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return None;
        }
        let parts: Vec<&str> = normalized.split('/').collect();

        if is_directory {
            self.explain_directory(&parts)
        } else {
            self.best_match(&normalized, &parts)
        }
    }

    fn best_match(&self, normalized: &str, parts: &[&str]) -> Option<RuleMatch<'_>> {
        let mut best: Option<RuleMatch<'_>> = None;
        for rule in &self.rules {
            let Some(specificity) = rule.specificity(normalized, parts, false) else {
                continue;
            };
            let candidate = rule.to_match(specificity);
            if best.map_or(true, |b| candidate.rank() > b.rank()) {
                best = Some(candidate);
            }
        }
        best
    }

    /// A directory is removable as a whole when a remove prefix rule covers
    /// it and no keep rule could reach the same rank anywhere beneath it.
    fn explain_directory(&self, parts: &[&str]) -> Option<RuleMatch<'_>> {
        let mut cover: Option<RuleMatch<'_>> = None;
        for rule in self.rules.iter().filter(|r| r.verdict == Verdict::Remove) {
            let CompiledMatcher::Prefix(prefixes) = &rule.matcher else {
                continue;
            };
            if let Some(specificity) = prefix_specificity(prefixes, parts) {
                let candidate = rule.to_match(specificity);
                if cover.map_or(true, |c| candidate.rank() > c.rank()) {
                    cover = Some(candidate);
                }
            }
        }
        let cover = cover?;

        let contested = self
            .rules
            .iter()
            .filter(|r| r.verdict == Verdict::Keep)
            .any(|rule| {
                let reach = match &rule.matcher {
                    CompiledMatcher::Prefix(prefixes) => prefixes
                        .iter()
                        .filter(|p| p.iter().zip(parts).all(|(a, b)| a == b))
                        .map(Vec::len)
                        .max(),
                    CompiledMatcher::Glob { specificity, .. } => specificity.iter().copied().max(),
                    CompiledMatcher::Extension(_) => Some(0),
                };
                reach.map_or(false, |s| (rule.priority, s) >= (cover.priority, cover.specificity))
            });

        if contested {
            None
        } else {
            Some(cover)
        }
    }
}

fn compile_rule(rule: &Rule) -> Result<CompiledRule> {
    let matcher = match &rule.matcher {
        Matcher::Prefix { prefixes } => CompiledMatcher::Prefix(
            prefixes
                .iter()
                .map(|p| split_components(&normalize_path(Path::new(p))))
                .collect(),
        ),
        Matcher::Glob { patterns } => {
            let mut builder = GlobSetBuilder::new();
            let mut specificity = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let glob = GlobBuilder::new(pattern.trim_start_matches('/'))
                    .case_insensitive(true)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        PruneError::RulesetLoad(format!(
                            "Invalid glob pattern '{}' in rule '{}': {}",
                            pattern, rule.name, e
                        ))
                    })?;
                builder.add(glob);
                specificity.push(glob_specificity(pattern));
            }
            let set = builder.build().map_err(|e| {
                PruneError::RulesetLoad(format!("Failed to build globset for '{}': {}", rule.name, e))
            })?;
            CompiledMatcher::Glob { set, specificity }
        }
        Matcher::Extension { extensions } => {
            CompiledMatcher::Extension(extensions.iter().map(|e| normalize_extension(e)).collect())
        }
    };

    Ok(CompiledRule {
        name: rule.name.clone(),
        verdict: rule.verdict,
        priority: rule.priority,
        matcher,
    })
}

/// Lowercase a relative path and join its components with `/`.
pub(crate) fn normalize_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}

/// `"DDS"`, `".dds"` and `"dds"` all become `".dds"`.
pub(crate) fn normalize_extension(ext: &str) -> String {
    format!(".{}", ext.trim().trim_start_matches('.').to_lowercase())
}

pub(crate) fn split_components(normalized: &str) -> Vec<String> {
    normalized
        .split('/')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn prefix_specificity(prefixes: &[Vec<String>], parts: &[&str]) -> Option<usize> {
    prefixes
        .iter()
        .filter(|p| is_prefix_of(p, parts))
        .map(Vec::len)
        .max()
}

pub(crate) fn is_prefix_of(prefix: &[String], parts: &[&str]) -> bool {
    !prefix.is_empty()
        && prefix.len() <= parts.len()
        && prefix.iter().zip(parts).all(|(a, b)| a == b)
}

fn glob_specificity(pattern: &str) -> usize {
    pattern
        .split('/')
        .filter(|c| !c.is_empty())
        .filter(|c| !c.chars().any(|ch| matches!(ch, '*' | '?' | '[' | '{')))
        .count()
}
