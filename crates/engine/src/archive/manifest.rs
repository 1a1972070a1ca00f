//! TOML frame manifests for [`LocalArchive`]
//!
//! ```toml
//! [[frame]]
//! id = "LT05_L2SP_231062_20050614"
//! source = "LANDSAT/LT05/C02/T1_L2"
//! date = "2005-06-14"
//! cloud_cover = 12.5
//!
//! [frame.bands]
//! SR_B3 = "lt05_20050614_b3.tif"
//! QA_PIXEL = "lt05_20050614_qa.tif"
//! ```
//!
//! Band paths are relative to the manifest's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strata_core::io::read_geotiff;
use strata_core::{Band, RasterFrame};
use tracing::{debug, info};

use super::local::{CatalogFrame, LocalArchive};
use crate::error::ArchiveError;

/// One frame listed in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub source: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub cloud_cover: f64,
    /// Native band name to GeoTIFF path
    pub bands: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameManifest {
    #[serde(default, rename = "frame")]
    pub frames: Vec<ManifestEntry>,
}

impl FrameManifest {
    pub fn from_toml_str(text: &str) -> Result<Self, ArchiveError> {
        toml::from_str(text).map_err(|e| ArchiveError::Manifest {
            path: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ArchiveError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ArchiveError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode every listed band, resolving relative paths against `base`.
    pub fn into_archive(self, base: &Path) -> Result<LocalArchive, ArchiveError> {
        let mut archive = LocalArchive::new();
        for entry in self.frames {
            let bands = entry
                .bands
                .iter()
                .map(|(name, file)| {
                    let path = base.join(file);
                    debug!(frame = %entry.id, band = %name, path = %path.display(), "reading band");
                    Ok(Band::new(name.clone(), read_geotiff::<f64, _>(&path)?))
                })
                .collect::<Result<Vec<_>, ArchiveError>>()?;
            archive.push(CatalogFrame {
                id: entry.id,
                source: entry.source,
                date: entry.date,
                cloud_cover: entry.cloud_cover,
                frame: RasterFrame::from_bands(bands)?,
            });
        }
        info!(frames = archive.len(), "loaded local archive");
        Ok(archive)
    }
}

impl LocalArchive {
    /// Load a manifest file and every frame it lists.
    pub fn from_manifest(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        FrameManifest::load(path)?.into_archive(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{AvailabilityArchive, FrameQuery, QueryOptions};
    use crate::period::{TimePeriod, WindowRadius};
    use std::io::Cursor;
    use strata_core::{BBox, Region};
    use tiff::encoder::{colortype::Gray16, TiffEncoder};

    fn write_tiff(path: &Path, data: &[u16]) {
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            encoder.write_image::<Gray16>(2, 2, data).unwrap();
        }
        fs::write(path, buf).unwrap();
    }

    #[test]
    fn parse_manifest() {
        let manifest = FrameManifest::from_toml_str(
            r#"
            [[frame]]
            id = "a"
            source = "LANDSAT/LT05/C02/T1_L2"
            date = "2005-06-14"
            bands = { SR_B3 = "a_b3.tif" }
            "#,
        )
        .unwrap();
        assert_eq!(manifest.frames.len(), 1);
        assert_eq!(manifest.frames[0].date, NaiveDate::from_ymd_opt(2005, 6, 14).unwrap());
        assert_eq!(manifest.frames[0].cloud_cover, 0.0);
    }

    #[test]
    fn bad_manifest() {
        assert!(matches!(
            FrameManifest::from_toml_str("[[frame]]\nid = 3"),
            Err(ArchiveError::Manifest { .. })
        ));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_tiff(&dir.path().join("b3.tif"), &[8000, 8000, 8000, 8000]);
        write_tiff(&dir.path().join("qa.tif"), &[0, 0, 8, 0]);
        fs::write(
            dir.path().join("frames.toml"),
            r#"
            [[frame]]
            id = "a"
            source = "S"
            date = "2005-06-14"
            cloud_cover = 5.0
            [frame.bands]
            SR_B3 = "b3.tif"
            QA_PIXEL = "qa.tif"
            "#,
        )
        .unwrap();

        let archive = LocalArchive::from_manifest(dir.path().join("frames.toml")).unwrap();
        assert_eq!(archive.len(), 1);

        let query = FrameQuery {
            sources: vec!["S".into()],
            range: TimePeriod::new(2005, WindowRadius::Exact).unwrap().range(),
            region: Region::new("r", BBox::new(0.0, -2.0, 2.0, 0.0), 1.0).unwrap(),
            masked: false,
            options: QueryOptions::default(),
        };
        assert_eq!(archive.query_count(&query).unwrap(), 1);
    }

    #[test]
    fn missing_band_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = FrameManifest::from_toml_str(
            "[[frame]]\nid = \"a\"\nsource = \"S\"\ndate = \"2005-01-01\"\nbands = { SR_B3 = \"nope.tif\" }",
        )
        .unwrap();
        assert!(matches!(
            manifest.into_archive(dir.path()),
            Err(ArchiveError::Raster(_))
        ));
    }
}
