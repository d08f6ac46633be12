//! Alias lookup and specifier rewriting.

use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::AliasRule;

/// An alias could not be turned into an existing directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("cannot resolve {specifier:?}: alias {symbol:?} points to missing directory {}", .target.display())]
    MissingTarget {
        specifier: String,
        symbol: String,
        target: PathBuf,
    },
}

/// Resolves import specifiers against a fixed set of alias rules.
///
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    /// Longest symbol first; ties keep declaration order.
    rules: Vec<AliasRule>,
}

impl AliasResolver {
    /// Trailing `/` is dropped from symbols, so `@/` behaves like `@`.
    pub fn new(mut rules: Vec<AliasRule>) -> Self {
        for rule in &mut rules {
            let trimmed = rule.symbol.trim_end_matches('/');
            if !trimmed.is_empty() && trimmed.len() != rule.symbol.len() {
                rule.symbol = trimmed.to_string();
            }
        }
        rules.sort_by(|a, b| b.symbol.len().cmp(&a.symbol.len()));
        Self { rules }
    }

    /// Rules in lookup order.
    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Find the longest rule whose symbol prefixes `specifier` on a segment
    /// boundary, along with the rest of the specifier after the separator.
    pub fn matching_rule<'s>(&self, specifier: &'s str) -> Option<(&AliasRule, &'s str)> {
        self.rules.iter().find_map(|rule| {
            strip_symbol(specifier, &rule.symbol).map(|rest| (rule, rest))
        })
    }

    /// Substitute the matched symbol without touching the filesystem.
    ///
    /// Specifiers no rule claims (packages, relative or absolute paths) are
    /// returned unchanged.
    pub fn rewrite<'s>(&self, specifier: &'s str) -> Cow<'s, str> {
        match self.matching_rule(specifier) {
            Some((rule, rest)) => Cow::Owned(join_target(rule, rest)),
            None => Cow::Borrowed(specifier),
        }
    }

    /// Rewrite `specifier`, failing if the alias target is not a directory.
    pub fn resolve<'s>(&self, specifier: &'s str) -> Result<Cow<'s, str>, ResolutionError> {
        let Some((rule, rest)) = self.matching_rule(specifier) else {
            return Ok(Cow::Borrowed(specifier));
        };

        if !rule.target_directory.is_dir() {
            return Err(ResolutionError::MissingTarget {
                specifier: specifier.to_string(),
                symbol: rule.symbol.clone(),
                target: rule.target_directory.clone(),
            });
        }

        let resolved = join_target(rule, rest);
        tracing::trace!(specifier, resolved = %resolved, alias = %rule.symbol, "Resolved import");
        Ok(Cow::Owned(resolved))
    }

    /// Check every alias target, returning all failures.
    pub fn verify_targets(&self) -> Result<(), Vec<ResolutionError>> {
        let errors: Vec<_> = self
            .rules
            .iter()
            .filter(|rule| !rule.target_directory.is_dir())
            .map(|rule| ResolutionError::MissingTarget {
                specifier: rule.symbol.clone(),
                symbol: rule.symbol.clone(),
                target: rule.target_directory.clone(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn strip_symbol<'s>(specifier: &'s str, symbol: &str) -> Option<&'s str> {
    if symbol.is_empty() {
        return None;
    }
    let rest = specifier.strip_prefix(symbol)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn join_target(rule: &AliasRule, rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        rule.target_directory.to_string_lossy().into_owned()
    } else {
        rule.target_directory.join(rest).to_string_lossy().into_owned()
    }
}
