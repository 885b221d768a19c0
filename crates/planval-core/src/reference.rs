//! ReferenceLoader (spec.md §4.2).
//!
//! Abstraction over the remote metadata/dictionary/polygon service, mirroring
//! the teacher's `FileSystem` trait: a `Send + Sync + Debug` trait object
//! with a production HTTP implementation and an in-memory test double. The
//! HTTP endpoint shapes are grounded on `original_source/.../database.py`'s
//! `APIClient` minus authentication (out of scope per spec.md §1); unlike
//! that client, this loader never retries or renews a token.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use geo_types::Geometry;

use crate::rule::Rule;

/// The four reference dictionaries besides the rule table (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictKind {
    ZfZrs,
    Hilucs1,
    Hilucs2,
    Hilucs3,
}

impl DictKind {
    fn path_segment(self) -> &'static str {
        match self {
            DictKind::ZfZrs => "zfzrs",
            DictKind::Hilucs1 => "hilucs1",
            DictKind::Hilucs2 => "hilucs2",
            DictKind::Hilucs3 => "hilucs3",
        }
    }
}

/// One entry of a reference dictionary (spec.md §3 "Reference dictionaries").
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DictEntry {
    pub definitie: String,
    #[serde(default)]
    pub definite_lung: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Dictionary {
    pub entries: Vec<DictEntry>,
}

impl Dictionary {
    pub fn contains_code(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.definitie == code)
    }

    pub fn find(&self, code: &str) -> Option<&DictEntry> {
        self.entries.iter().find(|e| e.definitie == code)
    }
}

/// Production and test implementations both implement this trait; validators
/// and the dispatcher only ever see `&dyn ReferenceLoader`.
pub trait ReferenceLoader: Send + Sync + std::fmt::Debug {
    fn load_rules(&self, version: &str, category: u32) -> anyhow::Result<Vec<Rule>>;
    fn load_dict(&self, kind: DictKind) -> anyhow::Result<Dictionary>;
    /// Resolve the administrative polygon for a SIRUTA id, reprojected to
    /// `EPSG:3844` client-side exactly as the original does with
    /// `gpd.GeoDataFrame(..., crs="EPSG:3844")`. `None` means "no such SIRUTA".
    fn load_uat(&self, siruta: &str) -> anyhow::Result<Option<Geometry<f64>>>;
    fn latest_version(&self) -> anyhow::Result<String>;
}

/// Talks to the real reference service over HTTP. Caches UAT polygon lookups
/// for the lifetime of the loader since spec.md §5 allows within-run caching
/// ("cache writes are safe because no other code path runs in parallel").
#[derive(Debug)]
pub struct HttpReferenceLoader {
    base_url: String,
    client: reqwest::blocking::Client,
    uat_cache: Mutex<HashMap<String, Option<Geometry<f64>>>>,
}

impl HttpReferenceLoader {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            uat_cache: Mutex::new(HashMap::new()),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}

impl ReferenceLoader for HttpReferenceLoader {
    fn load_rules(&self, version: &str, category: u32) -> anyhow::Result<Vec<Rule>> {
        // Template mirrors database.py: `.../rules/V/C` with the literal
        // placeholders substituted, not a path-parameter DSL.
        let path = format!("/rules/{version}/{category}")
            .replace('V', version)
            .replace('C', &category.to_string());
        self.get_json(&path)
    }

    fn load_dict(&self, kind: DictKind) -> anyhow::Result<Dictionary> {
        let path = format!("/metadata/{}", kind.path_segment());
        self.get_json(&path)
    }

    fn load_uat(&self, siruta: &str) -> anyhow::Result<Option<Geometry<f64>>> {
        if let Some(cached) = self.uat_cache.lock().unwrap().get(siruta) {
            return Ok(cached.clone());
        }

        let path = format!("/metadata/uat/{siruta}");
        let geometry: Option<Geometry<f64>> = match self.get_json::<geojson::GeoJson>(&path) {
            Ok(geojson::GeoJson::FeatureCollection(fc)) => fc
                .features
                .into_iter()
                .find_map(|f| f.geometry)
                .and_then(|g| geo_types::Geometry::try_from(g).ok()),
            Ok(geojson::GeoJson::Feature(f)) => {
                f.geometry.and_then(|g| geo_types::Geometry::try_from(g).ok())
            }
            Ok(geojson::GeoJson::Geometry(g)) => geo_types::Geometry::try_from(g).ok(),
            Err(_) => None,
        };

        self.uat_cache
            .lock()
            .unwrap()
            .insert(siruta.to_string(), geometry.clone());
        Ok(geometry)
    }

    fn latest_version(&self) -> anyhow::Result<String> {
        #[derive(serde::Deserialize)]
        struct VersionEntry {
            definitie: String,
        }
        let entries: Vec<VersionEntry> = self.get_json("/metadata/version")?;
        entries
            .into_iter()
            .next()
            .map(|e| e.definitie)
            .ok_or_else(|| anyhow::anyhow!("version endpoint returned no entries"))
    }
}

#[cfg(test)]
pub mod stub {
    //! In-memory `ReferenceLoader` for dispatcher/validator tests, mirroring
    //! the shape of `fs::MockFileSystem`.

    use super::*;

    #[derive(Debug, Default)]
    pub struct StubReferenceLoader {
        pub rules: Vec<Rule>,
        pub dicts: HashMap<DictKind, Dictionary>,
        pub uat: HashMap<String, Geometry<f64>>,
        pub version: String,
    }

    impl StubReferenceLoader {
        pub fn new() -> Self {
            Self {
                version: "2.0.0".to_string(),
                ..Default::default()
            }
        }

        pub fn with_rule(mut self, rule: Rule) -> Self {
            self.rules.push(rule);
            self
        }

        pub fn with_dict(mut self, kind: DictKind, dict: Dictionary) -> Self {
            self.dicts.insert(kind, dict);
            self
        }

        pub fn with_uat(mut self, siruta: impl Into<String>, geometry: Geometry<f64>) -> Self {
            self.uat.insert(siruta.into(), geometry);
            self
        }
    }

    impl ReferenceLoader for StubReferenceLoader {
        fn load_rules(&self, _version: &str, category: u32) -> anyhow::Result<Vec<Rule>> {
            Ok(self
                .rules
                .iter()
                .filter(|r| r.categorie_regula_id == category)
                .cloned()
                .collect())
        }

        fn load_dict(&self, kind: DictKind) -> anyhow::Result<Dictionary> {
            Ok(self.dicts.get(&kind).cloned().unwrap_or_default())
        }

        fn load_uat(&self, siruta: &str) -> anyhow::Result<Option<Geometry<f64>>> {
            Ok(self.uat.get(siruta).cloned())
        }

        fn latest_version(&self) -> anyhow::Result<String> {
            Ok(self.version.clone())
        }
    }

    #[test]
    fn stub_filters_rules_by_category() {
        use crate::rule::Rule;

        let rule = |cat: u32| Rule {
            numar_regula: 1,
            tip_regula_id: 1,
            categorie_regula_id: cat,
            tip_validare_id: 1,
            tip_alerta_id: 1,
            formula_regula: String::new(),
            valoare_regula: String::new(),
            descriere: "d".into(),
            pass_alerta: "p".into(),
            fail_alerta: "f".into(),
            error_alerta: "e".into(),
            mesaj_modificare: "-".into(),
            eroare_modificare: "-".into(),
        };

        let stub = StubReferenceLoader::new().with_rule(rule(1)).with_rule(rule(3));
        let loaded = stub.load_rules("2.0.0", 1).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn stub_returns_none_for_unknown_siruta() {
        let stub = StubReferenceLoader::new();
        assert!(stub.load_uat("999999").unwrap().is_none());
    }
}
