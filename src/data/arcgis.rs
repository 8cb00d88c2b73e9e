//! Raw-record acquisition: feature-service fetch and local snapshots.
//!
//! The numeric pipeline never touches the network itself; it consumes
//! already-parsed [`RawRecord`]s. This module is the collaborator that
//! produces them, either from the upstream ArcGIS FeatureServer or from a
//! locally cached JSON snapshot with the same logical shape.

use std::path::Path;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::RawRecord;
use crate::error::Error;

/// Upstream feature service carrying the daily case-count layers.
pub const DEFAULT_BASE_URL: &str =
    "https://services5.arcgis.com/fsYDFeRKu1hELJJs/arcgis/rest/services/FOHM_Covid_19_FME_1/FeatureServer/";

/// Layer index of the daily per-region dataset.
pub const DAILY_REGIONS_LAYER: u8 = 1;

const QUERY_PATH: &str = "/query?f=json&outFields=*";
const WHERE_ALL: &str = "&where=1%3D1";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<RawRecord>,
}

/// Blocking client for one feature service.
pub struct FeatureClient {
    base_url: String,
    client: Client,
}

impl FeatureClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Fetch all records of one layer.
    pub fn fetch_layer(&self, layer: u8) -> Result<Vec<RawRecord>, Error> {
        let url = format!("{}{layer}{QUERY_PATH}{WHERE_ALL}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Http(format!("request to {url} failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Http(format!("{e}")))?;

        let collection: FeatureCollection = response
            .json()
            .map_err(|e| Error::Http(format!("invalid feature collection from {url}: {e}")))?;
        Ok(collection.features)
    }
}

/// Read records from a locally cached feature-collection JSON file.
pub fn load_snapshot(path: &Path) -> Result<Vec<RawRecord>, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("failed to read snapshot '{}': {e}", path.display())))?;
    parse_features(&text)
        .map_err(|e| Error::Io(format!("invalid snapshot '{}': {e}", path.display())))
}

fn parse_features(text: &str) -> Result<Vec<RawRecord>, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    Ok(collection.features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_collection_with_ordered_attributes() {
        let text = r#"{
            "features": [
                {"attributes": {"Statistikdatum": 1583020800000, "Stockholm": 3, "Uppsala": null}},
                {"attributes": {"Statistikdatum": 1583107200000, "Stockholm": 1, "Uppsala": 2}}
            ]
        }"#;
        let records = parse_features(text).unwrap();

        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].attributes.keys().collect();
        assert_eq!(keys, ["Statistikdatum", "Stockholm", "Uppsala"]);
        assert!(records[0].attributes["Uppsala"].is_null());
    }

    #[test]
    fn missing_snapshot_file_is_an_io_error() {
        let err = load_snapshot(Path::new("/no/such/snapshot.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
