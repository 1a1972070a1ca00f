//! Engine configuration
//!
//! Loaded once, validated, then only borrowed. A TOML file may add or
//! override families and may replace the policy table; anything it leaves
//! out falls back to the Landsat Collection 2 built-ins.
//!
//! ```toml
//! masked_availability = "frame-count"   # or { valid-coverage = 0.2 }
//! max_cloud_cover = 90.0
//!
//! [families.L5]
//! tiers = ["LANDSAT/LT05/C02/T1_L2", "LANDSAT/LT05/C02/T2_L2"]
//! bands = { R = "SR_B3", G = "SR_B2", B = "SR_B1", NIR = "SR_B4" }
//!
//! [[policy]]
//! from = 2013
//! to = 2021
//! families = ["L8", "L9"]
//! fallback = { members = ["L5", "L7"] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::archive::{MaskedAvailability, QueryOptions};
use crate::error::{EngineError, Result};
use crate::policy::{PolicyEntry, SensorPolicy};
use crate::registry::{BandMap, CanonicalRole, SourceFamily, SourceRegistry};

fn default_max_cloud_cover() -> f64 {
    QueryOptions::default().max_cloud_cover
}

#[derive(Debug, Deserialize)]
struct FamilyConfig {
    tiers: Vec<String>,
    bands: BandMap,
}

/// On-disk layout. Unknown top-level tables (e.g. `[stac]`) belong to
/// other consumers of the same file and are ignored here.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    masked_availability: MaskedAvailability,
    #[serde(default = "default_max_cloud_cover")]
    max_cloud_cover: f64,
    #[serde(default)]
    families: BTreeMap<String, FamilyConfig>,
    #[serde(default)]
    policy: Vec<PolicyEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub registry: SourceRegistry,
    pub policy: SensorPolicy,
    pub options: QueryOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EngineConfig {
    /// Landsat Collection 2 families and mission preferences
    pub fn builtin() -> Self {
        Self {
            registry: SourceRegistry::landsat_c2(),
            policy: SensorPolicy::landsat_c2(),
            options: QueryOptions::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loading engine config");
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;

        let mut config = Self::builtin();
        config.options = QueryOptions {
            max_cloud_cover: file.max_cloud_cover,
            masked_availability: file.masked_availability,
        };
        for (id, family) in file.families {
            config
                .registry
                .insert(SourceFamily::new(id, family.tiers, family.bands));
        }
        if !file.policy.is_empty() {
            config.policy = SensorPolicy::new(file.policy);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let cc = self.options.max_cloud_cover;
        if !(0.0..=100.0).contains(&cc) {
            return Err(EngineError::Config(format!(
                "max_cloud_cover {cc} outside 0..=100"
            )));
        }
        if let MaskedAvailability::ValidCoverage(min) = self.options.masked_availability {
            if !(0.0..=1.0).contains(&min) {
                return Err(EngineError::Config(format!(
                    "valid-coverage fraction {min} outside 0..=1"
                )));
            }
        }
        for family in self.registry.families() {
            if family.tiers.is_empty() {
                return Err(EngineError::Config(format!(
                    "family {} has no archive tiers",
                    family.id
                )));
            }
        }
        self.policy.validate(&self.registry)?;

        // Families the policy can pick must serve every product.
        for entry in self.policy.entries() {
            let fallback = entry.fallback.iter().flat_map(|f| &f.members);
            for id in entry.families.iter().chain(fallback) {
                let family = self.registry.get(id)?;
                let roles = [
                    CanonicalRole::Red,
                    CanonicalRole::Green,
                    CanonicalRole::Blue,
                    CanonicalRole::Nir,
                ];
                if let Some(role) = roles.iter().find(|r| !family.bands.contains_key(*r)) {
                    return Err(EngineError::Config(format!(
                        "family {id} has no band for role {role}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_valid() {
        let config = EngineConfig::builtin();
        config.validate().unwrap();
        assert_eq!(config.options.max_cloud_cover, 90.0);
        assert_eq!(config.options.masked_availability, MaskedAvailability::FrameCount);
    }

    #[test]
    fn empty_file_is_builtin() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::builtin());
    }

    #[test]
    fn parse_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            masked_availability = { valid-coverage = 0.25 }
            max_cloud_cover = 60.0

            [families.S2]
            tiers = ["COPERNICUS/S2_SR"]
            bands = { R = "B4", G = "B3", B = "B2", NIR = "B8" }

            [[policy]]
            from = 2017
            families = ["S2", "L8"]
            fallback = { members = ["L8", "L9"], label = "OLI" }

            [stac]
            url = "ignored"
            "#,
        )
        .unwrap();
        assert_eq!(config.options.masked_availability, MaskedAvailability::ValidCoverage(0.25));
        assert_eq!(config.options.max_cloud_cover, 60.0);
        assert!(config.registry.contains("S2"));
        assert!(config.registry.contains("L5"));
        let entry = config.policy.entry_for(2020).unwrap();
        assert_eq!(entry.fallback.as_ref().unwrap().label(), "OLI");
        assert!(config.policy.entry_for(2005).is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(EngineConfig::from_toml_str("max_cloud_cover = 120.0").is_err());
        assert!(EngineConfig::from_toml_str("masked_availability = { valid-coverage = 2.0 }").is_err());
        assert!(EngineConfig::from_toml_str(
            "[[policy]]\nfrom = 2000\nfamilies = [\"MODIS\"]"
        )
        .is_err());
        assert!(EngineConfig::from_toml_str(
            "[families.X]\ntiers = [\"x\"]\nbands = { R = \"b1\" }\n[[policy]]\nfrom = 2000\nfamilies = [\"X\"]"
        )
        .is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(&path, "max_cloud_cover = 40.0\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().options.max_cloud_cover, 40.0);
        assert!(EngineConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
