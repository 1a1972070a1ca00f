//! Source families and canonical band roles

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A source-independent band identifier.
///
/// Every composite handed to callers names its bands by role, whatever
/// the producing family calls them natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalRole {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "NIR")]
    Nir,
}

impl CanonicalRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "R",
            Self::Green => "G",
            Self::Blue => "B",
            Self::Nir => "NIR",
        }
    }
}

impl fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical role to native band name.
pub type BandMap = BTreeMap<CanonicalRole, String>;

/// The band set a composite request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Product {
    /// R, G, B
    #[default]
    TrueColor,
    /// R, NIR
    RedNir,
    /// R, G, B, NIR
    Spectral,
}

impl Product {
    pub fn roles(self) -> &'static [CanonicalRole] {
        use CanonicalRole::*;
        match self {
            Self::TrueColor => &[Red, Green, Blue],
            Self::RedNir => &[Red, Nir],
            Self::Spectral => &[Red, Green, Blue, Nir],
        }
    }

    /// Band names of every composite for this product, in order
    pub fn canonical_names(self) -> Vec<&'static str> {
        self.roles().iter().map(|r| r.as_str()).collect()
    }

    pub const ALL: [Product; 3] = [Self::TrueColor, Self::RedNir, Self::Spectral];
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TrueColor => "true-color",
            Self::RedNir => "red-nir",
            Self::Spectral => "spectral",
        })
    }
}

impl FromStr for Product {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string() == s)
            .ok_or_else(|| EngineError::Config(format!("unknown product '{s}'")))
    }
}

/// Expected native bands for one family and product, paired with the
/// canonical roles they are renamed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSpec {
    pub roles: Vec<CanonicalRole>,
    pub native: Vec<String>,
}

impl BandSpec {
    pub fn canonical_names(&self) -> Vec<&'static str> {
        self.roles.iter().map(|r| r.as_str()).collect()
    }
}

/// A sensor family: the archive sources queried together for it and its
/// native band naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFamily {
    pub id: String,
    /// Archive source ids, primary first. Queried as one merged source.
    pub tiers: Vec<String>,
    pub bands: BandMap,
}

impl SourceFamily {
    pub fn new(id: impl Into<String>, tiers: Vec<String>, bands: BandMap) -> Self {
        Self {
            id: id.into(),
            tiers,
            bands,
        }
    }

    /// Native band names for the roles of `product`
    pub fn band_spec(&self, product: Product) -> Result<BandSpec> {
        let roles = product.roles().to_vec();
        let native = roles
            .iter()
            .map(|role| {
                self.bands.get(role).cloned().ok_or_else(|| {
                    EngineError::Config(format!(
                        "family {} has no band for role {role} required by {product}",
                        self.id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BandSpec { roles, native })
    }
}

/// Immutable table of known source families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    families: BTreeMap<String, SourceFamily>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: SourceFamily) {
        self.families.insert(family.id.clone(), family);
    }

    pub fn get(&self, id: &str) -> Result<&SourceFamily> {
        self.families
            .get(id)
            .ok_or_else(|| EngineError::UnknownFamily(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.families.contains_key(id)
    }

    pub fn families(&self) -> impl Iterator<Item = &SourceFamily> {
        self.families.values()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Landsat Collection 2 Level-2 surface reflectance, Tier 1 and Tier 2.
    pub fn landsat_c2() -> Self {
        use CanonicalRole::*;
        let tm = [(Red, "SR_B3"), (Green, "SR_B2"), (Blue, "SR_B1"), (Nir, "SR_B4")];
        let oli = [(Red, "SR_B4"), (Green, "SR_B3"), (Blue, "SR_B2"), (Nir, "SR_B5")];
        let mut registry = Self::new();
        for (id, mission, bands) in [
            ("L5", "LT05", tm),
            ("L7", "LE07", tm),
            ("L8", "LC08", oli),
            ("L9", "LC09", oli),
        ] {
            let tiers = ["T1_L2", "T2_L2"]
                .iter()
                .map(|t| format!("LANDSAT/{mission}/C02/{t}"))
                .collect();
            let bands = bands
                .iter()
                .map(|(role, native)| (*role, native.to_string()))
                .collect();
            registry.insert(SourceFamily::new(id, tiers, bands));
        }
        registry
    }
}
