//! First-match eligibility rules
//!
//! Rules are evaluated in declaration order and the first pattern found
//! anywhere in the display name wins, even when a later rule is more
//! specific. A name matching no rule is unrestricted.

use crate::error::{CatalogError, Result};
use giftpool_types::{EligibilityRule, GiftId};
use regex::Regex;
use std::collections::BTreeSet;

/// Outcome of matching a display name against the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedGifts<'a> {
    /// No rule matched; every gift is eligible subject to capacity.
    Unrestricted,
    /// A rule matched; only these gifts are eligible.
    Only(&'a BTreeSet<GiftId>),
}

impl AllowedGifts<'_> {
    pub fn permits(&self, gift: &GiftId) -> bool {
        match self {
            AllowedGifts::Unrestricted => true,
            AllowedGifts::Only(gifts) => gifts.contains(gift),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    rule: EligibilityRule,
}

/// Compiled, ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct EligibilityMatcher {
    rules: Vec<CompiledRule>,
}

impl EligibilityMatcher {
    /// Compile `rules`, keeping their order.
    pub fn compile(rules: &[EligibilityRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledRule {
                        regex,
                        rule: rule.clone(),
                    })
                    .map_err(|source| CatalogError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Allowed set of the first rule whose pattern occurs in `display_name`.
    pub fn allowed_gifts(&self, display_name: &str) -> AllowedGifts<'_> {
        self.rules
            .iter()
            .find(|compiled| compiled.regex.is_match(display_name))
            .map(|compiled| {
                tracing::trace!(
                    pattern = %compiled.rule.pattern,
                    display_name,
                    "Eligibility rule matched"
                );
                AllowedGifts::Only(&compiled.rule.gifts)
            })
            .unwrap_or(AllowedGifts::Unrestricted)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &EligibilityRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
