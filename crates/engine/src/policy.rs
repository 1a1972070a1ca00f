//! Per-period sensor preferences

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::period::TimePeriod;
use crate::registry::{SourceFamily, SourceRegistry};

/// Families merged into one wider query, tried after every preferred
/// family has failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackGroup {
    pub members: Vec<String>,
    /// Defaults to the member ids joined with `/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Family whose native band names the merged query uses. Defaults to
    /// the first member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands_from: Option<String>,
}

impl FallbackGroup {
    pub fn new<S: Into<String>>(members: impl IntoIterator<Item = S>) -> Self {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            label: None,
            bands_from: None,
        }
    }

    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.members.join("/"))
    }

    /// A synthetic family spanning every member's archive tiers.
    pub fn merged(&self, registry: &SourceRegistry) -> Result<SourceFamily> {
        let mut tiers = Vec::new();
        for id in &self.members {
            for tier in &registry.get(id)?.tiers {
                if !tiers.contains(tier) {
                    tiers.push(tier.clone());
                }
            }
        }
        let band_source = match (&self.bands_from, self.members.first()) {
            (Some(id), _) | (None, Some(id)) => registry.get(id)?,
            (None, None) => {
                return Err(EngineError::Config("fallback group has no members".into()))
            }
        };
        Ok(SourceFamily::new(
            self.label(),
            tiers,
            band_source.bands.clone(),
        ))
    }
}

/// Preferences for an inclusive span of years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub from: i32,
    /// Open-ended when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i32>,
    pub families: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackGroup>,
}

impl PolicyEntry {
    pub fn covers(&self, year: i32) -> bool {
        year >= self.from && self.to.map_or(true, |to| year <= to)
    }
}

/// Ordered table of [`PolicyEntry`]. The first entry covering a year wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorPolicy {
    entries: Vec<PolicyEntry>,
}

impl SensorPolicy {
    pub fn new(entries: Vec<PolicyEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PolicyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry covering `year`. Years outside [`TimePeriod::YEARS`] have none,
    /// even under an open-ended entry.
    pub fn entry_for(&self, year: i32) -> Option<&PolicyEntry> {
        if !TimePeriod::YEARS.contains(&year) {
            return None;
        }
        self.entries.iter().find(|e| e.covers(year))
    }

    /// Every family named by the table must exist in `registry`, and every
    /// entry must prefer at least one family.
    pub fn validate(&self, registry: &SourceRegistry) -> Result<()> {
        for entry in &self.entries {
            if entry.families.is_empty() {
                return Err(EngineError::Config(format!(
                    "policy entry from {} lists no families",
                    entry.from
                )));
            }
            if entry.to.is_some_and(|to| to < entry.from) {
                return Err(EngineError::Config(format!(
                    "policy entry from {} ends before it starts",
                    entry.from
                )));
            }
            let mut named: BTreeSet<&str> = entry.families.iter().map(String::as_str).collect();
            if let Some(fallback) = &entry.fallback {
                if fallback.members.is_empty() {
                    return Err(EngineError::Config(format!(
                        "policy entry from {} has an empty fallback group",
                        entry.from
                    )));
                }
                named.extend(fallback.members.iter().map(String::as_str));
                named.extend(fallback.bands_from.as_deref());
            }
            for id in named {
                if !registry.contains(id) {
                    return Err(EngineError::Config(format!(
                        "policy entry from {} names unknown family {id}",
                        entry.from
                    )));
                }
            }
        }
        Ok(())
    }

    /// Landsat mission preferences: TM/ETM+ through 2012, OLI after, with
    /// the older sensors as a merged fallback.
    pub fn landsat_c2() -> Self {
        let fallback = || {
            Some(FallbackGroup {
                bands_from: Some("L5".into()),
                ..FallbackGroup::new(["L5", "L7"])
            })
        };
        Self::new(vec![
            PolicyEntry {
                from: 1984,
                to: Some(2012),
                families: vec!["L5".into(), "L7".into()],
                fallback: None,
            },
            PolicyEntry {
                from: 2013,
                to: Some(2021),
                families: vec!["L8".into(), "L9".into()],
                fallback: fallback(),
            },
            PolicyEntry {
                from: 2022,
                to: None,
                families: vec!["L9".into(), "L8".into()],
                fallback: fallback(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_lookup() {
        let policy = SensorPolicy::landsat_c2();
        assert_eq!(policy.entry_for(2005).unwrap().families, vec!["L5", "L7"]);
        assert_eq!(policy.entry_for(2013).unwrap().families, vec!["L8", "L9"]);
        assert_eq!(policy.entry_for(2025).unwrap().families, vec!["L9", "L8"]);
        assert!(policy.entry_for(1970).is_none());
        assert_eq!(policy.entry_for(2200).unwrap().families, vec!["L9", "L8"]);
        assert!(policy.entry_for(2201).is_none());
        assert!(policy.entry_for(2012).unwrap().fallback.is_none());
    }

    #[test]
    fn fallback_merges_tiers() {
        let registry = SourceRegistry::landsat_c2();
        let group = FallbackGroup::new(["L5", "L7"]);
        assert_eq!(group.label(), "L5/L7");

        let merged = group.merged(&registry).unwrap();
        assert_eq!(merged.id, "L5/L7");
        assert_eq!(merged.tiers.len(), 4);
        assert_eq!(merged.bands, registry.get("L5").unwrap().bands);
    }

    #[test]
    fn fallback_label_override() {
        let group = FallbackGroup {
            label: Some("TM".into()),
            ..FallbackGroup::new(["L5"])
        };
        assert_eq!(group.label(), "TM");
    }

    #[test]
    fn validate_rejects_unknown_family() {
        let registry = SourceRegistry::landsat_c2();
        assert!(SensorPolicy::landsat_c2().validate(&registry).is_ok());

        let bad = SensorPolicy::new(vec![PolicyEntry {
            from: 2000,
            to: None,
            families: vec!["S2".into()],
            fallback: None,
        }]);
        assert!(matches!(bad.validate(&registry), Err(EngineError::Config(_))));

        let backwards = SensorPolicy::new(vec![PolicyEntry {
            from: 2010,
            to: Some(2000),
            families: vec!["L5".into()],
            fallback: None,
        }]);
        assert!(backwards.validate(&registry).is_err());
    }
}
