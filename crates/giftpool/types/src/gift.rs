//! Catalog records: gifts and eligibility rules

use crate::error::TypesError;
use crate::ids::GiftId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A catalog item with a global and a per-person claim limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,

    /// Total claims allowed across all persons.
    #[serde(alias = "total_count")]
    pub global_capacity: u32,

    /// Maximum claims by a single person.
    #[serde(alias = "count_per_user")]
    pub per_person_capacity: u32,
}

impl Gift {
    pub fn new(id: GiftId, global_capacity: u32, per_person_capacity: u32) -> Self {
        Self {
            id,
            global_capacity,
            per_person_capacity,
        }
    }
}

/// Name pattern restricting which gifts a matching person may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRule {
    /// Regular expression searched (not full-matched) in the display name.
    pub pattern: String,

    /// Gifts a matching person is allowed to claim.
    pub gifts: BTreeSet<GiftId>,
}

impl EligibilityRule {
    pub fn new(
        pattern: impl Into<String>,
        gifts: impl IntoIterator<Item = GiftId>,
    ) -> Result<Self, TypesError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(TypesError::EmptyPattern);
        }
        Ok(Self {
            pattern,
            gifts: gifts.into_iter().collect(),
        })
    }
}

/// Serialized form of the catalog. Rule order is declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub gifts: Vec<Gift>,

    #[serde(default)]
    pub rules: Vec<EligibilityRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_accepts_legacy_field_names() {
        let gift: Gift = serde_json::from_value(serde_json::json!({
            "id": "electric_razor",
            "total_count": 1,
            "count_per_user": 1,
        }))
        .unwrap();
        assert_eq!(gift, Gift::new(GiftId::new("electric_razor"), 1, 1));
    }

    #[test]
    fn test_rule_rejects_empty_pattern() {
        assert_eq!(
            EligibilityRule::new("", [GiftId::new("g1")]),
            Err(TypesError::EmptyPattern)
        );
    }

    #[test]
    fn test_catalog_document_keeps_rule_order() {
        let doc: CatalogDocument = serde_json::from_value(serde_json::json!({
            "gifts": [],
            "rules": [
                { "pattern": "^A", "gifts": ["g1"] },
                { "pattern": "^AB", "gifts": ["g2"] },
            ],
        }))
        .unwrap();
        let patterns: Vec<_> = doc.rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["^A", "^AB"]);
    }
}
