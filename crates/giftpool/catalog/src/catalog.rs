//! Read-only gift catalog

use crate::error::{CatalogError, Result};
use crate::matcher::EligibilityMatcher;
use giftpool_types::{CatalogDocument, EligibilityRule, Gift, GiftId};
use std::collections::HashMap;

/// Ordered gift list plus compiled eligibility rules.
///
/// Immutable once built. Administrative changes produce a new `Catalog`
/// which callers swap in wholesale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    gifts: Vec<Gift>,
    index: HashMap<GiftId, usize>,
    rules: Vec<EligibilityRule>,
    matcher: EligibilityMatcher,
}

impl Catalog {
    /// Validate and compile a catalog document.
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let mut index = HashMap::with_capacity(document.gifts.len());
        for (position, gift) in document.gifts.iter().enumerate() {
            if index.insert(gift.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateGift(gift.id.clone()));
            }
        }

        for rule in &document.rules {
            if let Some(gift) = rule.gifts.iter().find(|gift| !index.contains_key(*gift)) {
                return Err(CatalogError::UnknownRuleGift {
                    pattern: rule.pattern.clone(),
                    gift: gift.clone(),
                });
            }
        }

        let matcher = EligibilityMatcher::compile(&document.rules)?;

        tracing::debug!(
            gifts = document.gifts.len(),
            rules = document.rules.len(),
            "Catalog loaded"
        );

        Ok(Self {
            gifts: document.gifts,
            index,
            rules: document.rules,
            matcher,
        })
    }

    /// Catalog with gifts only and no rules.
    pub fn with_gifts(gifts: Vec<Gift>) -> Result<Self> {
        Self::from_document(CatalogDocument {
            gifts,
            rules: Vec::new(),
        })
    }

    /// Gifts in declared order.
    pub fn list_gifts(&self) -> &[Gift] {
        &self.gifts
    }

    /// Rules in declared order.
    pub fn list_rules(&self) -> &[EligibilityRule] {
        &self.rules
    }

    pub fn gift(&self, id: &GiftId) -> Option<&Gift> {
        self.index.get(id).map(|position| &self.gifts[*position])
    }

    pub fn contains(&self, id: &GiftId) -> bool {
        self.index.contains_key(id)
    }

    pub fn matcher(&self) -> &EligibilityMatcher {
        &self.matcher
    }

    pub fn len(&self) -> usize {
        self.gifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gifts.is_empty()
    }

    /// Serializable form of this catalog.
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            gifts: self.gifts.clone(),
            rules: self.rules.clone(),
        }
    }
}
