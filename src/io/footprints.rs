use crate::types::{ChipError, ChipResult, DamageClass};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Root of a footprint label document. The geometry we extract from lives
/// under `features.lng_lat`; pixel-space duplicates of the same footprints
/// and any other sections are ignored.
#[derive(Debug, Deserialize)]
struct FootprintDocument {
    features: FeatureSets,
}

#[derive(Debug, Deserialize)]
struct FeatureSets {
    lng_lat: Vec<Footprint>,
}

/// One building footprint: a WKT polygon in lon/lat plus its label
/// properties.
#[derive(Debug, Clone, Deserialize)]
pub struct Footprint {
    pub wkt: String,
    pub properties: FootprintProperties,
}

/// Label properties attached to a footprint. Pre-disaster features carry no
/// `subtype`; unknown extra properties are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FootprintProperties {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub feature_type: Option<String>,
}

impl Footprint {
    /// Damage classification for a post-disaster footprint. Absent or
    /// unrecognized subtypes fail this footprint only, not the batch.
    pub fn damage_class(&self) -> ChipResult<DamageClass> {
        match self.properties.subtype.as_deref() {
            Some(subtype) => subtype.parse(),
            None => Err(ChipError::MissingField("properties.subtype".to_string())),
        }
    }
}

/// Parsed footprint collection for one image.
pub struct FootprintCollection {
    pub buildings: Vec<Footprint>,
}

impl FootprintCollection {
    /// Load and deserialize a footprint JSON file. An unreadable or invalid
    /// document is fatal for the run.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ChipResult<Self> {
        log::info!("Loading footprints from: {}", path.as_ref().display());
        let file = File::open(path.as_ref())?;
        let document: FootprintDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                ChipError::InvalidJson(format!(
                    "footprint file {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        log::debug!("Found {} building footprints", document.features.lng_lat.len());
        Ok(FootprintCollection {
            buildings: document.features.lng_lat,
        })
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}
