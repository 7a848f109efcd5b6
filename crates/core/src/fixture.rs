use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::types::DeviceEntry;

/// Device list compiled into the binary and used when no fixture file is configured.
pub const BUILTIN_FIXTURE: &str = include_str!("../fixtures/devices.json");

/// Where a seed fixture was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    Builtin,
    File(PathBuf),
}

impl fmt::Display for FixtureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Validated set of documents inserted on first initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedFixture {
    documents: Vec<DeviceEntry>,
    source: FixtureSource,
}

impl SeedFixture {
    /// Loads the fixture from `path`, or the built-in device list when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, FixtureError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self, FixtureError> {
        Self::from_json(BUILTIN_FIXTURE, FixtureSource::Builtin)
    }

    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, FixtureSource::File(path.to_path_buf()))
    }

    /// Decodes a JSON array of devices and validates it.
    pub fn from_json(raw: &str, source: FixtureSource) -> Result<Self, FixtureError> {
        let documents: Vec<DeviceEntry> = serde_json::from_str(raw)?;
        validate(&documents)?;
        Ok(Self { documents, source })
    }

    pub fn documents(&self) -> &[DeviceEntry] {
        &self.documents
    }

    pub fn source(&self) -> &FixtureSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn validate(documents: &[DeviceEntry]) -> Result<(), FixtureError> {
    if documents.is_empty() {
        return Err(FixtureError::Empty);
    }

    let mut seen_ids = HashSet::with_capacity(documents.len());
    for (index, device) in documents.iter().enumerate() {
        if device.id.trim().is_empty() {
            return Err(FixtureError::MissingId { index });
        }
        if !seen_ids.insert(device.id.as_str()) {
            return Err(FixtureError::DuplicateId(device.id.clone()));
        }
        if !device.price.is_finite() || device.price < 0.0 {
            return Err(FixtureError::InvalidPrice {
                device: device.id.clone(),
                price: device.price,
            });
        }

        let mut seen_logs = HashSet::with_capacity(device.log_list.len());
        for log in &device.log_list {
            if log.device_id.trim().is_empty() {
                return Err(FixtureError::MissingLogDevice {
                    device: device.id.clone(),
                    log: log.id,
                });
            }
            if !seen_logs.insert(log.id) {
                return Err(FixtureError::DuplicateLogId {
                    device: device.id.clone(),
                    log: log.id,
                });
            }
        }
    }

    Ok(())
}

/// Errors raised while loading or validating a seed fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode fixture json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fixture contains no documents")]
    Empty,
    #[error("fixture document #{index} has an empty id")]
    MissingId { index: usize },
    #[error("fixture document id {0} appears more than once")]
    DuplicateId(String),
    #[error("fixture document {device} has invalid price {price}")]
    InvalidPrice { device: String, price: f64 },
    #[error("log entry {log} of device {device} has an empty deviceId")]
    MissingLogDevice { device: String, log: i64 },
    #[error("log entry id {log} appears more than once in device {device}")]
    DuplicateLogId { device: String, log: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn builtin_fixture_holds_two_devices() {
        let fixture = SeedFixture::builtin().expect("builtin fixture is valid");
        assert_eq!(fixture.source(), &FixtureSource::Builtin);
        assert_eq!(fixture.len(), 2);

        let crp = &fixture.documents()[0];
        assert_eq!(crp.id, "x321ab3");
        assert_eq!(crp.name, "CRP");
        assert_eq!(crp.device_id, "1-crp");
        assert_eq!(crp.price, 4.5);
        assert_eq!(
            crp.warranty_until,
            Utc.with_ymd_and_hms(2038, 12, 24, 10, 5, 0).unwrap()
        );
        let log_ids: Vec<i64> = crp.log_list.iter().map(|log| log.id).collect();
        assert_eq!(log_ids, vec![1, 2, 3]);
        assert!(crp.log_list.iter().all(|log| log.device_id == "1-crp"));
        assert_eq!(crp.log_list[2].text, "testovanie zariadenia");
        assert_eq!(
            crp.log_list[2].created_at,
            Utc.with_ymd_and_hms(2021, 12, 30, 10, 5, 0).unwrap()
        );

        let ekg = &fixture.documents()[1];
        assert_eq!(ekg.id, "c421fu6");
        assert_eq!(ekg.device_id, "2-ekg");
        assert_eq!(ekg.price, 1059.99);
        assert!(ekg.log_list.is_empty());
    }

    #[test]
    fn load_without_path_uses_builtin() {
        let fixture = SeedFixture::load(None).expect("builtin fixture is valid");
        assert_eq!(fixture, SeedFixture::builtin().expect("builtin"));
    }

    #[test]
    fn loads_fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id":"m-1","name":"Monitor","deviceId":"9-mon","warrantyUntil":"2032-02-02T00:00:00Z","price":10}}]"#
        )
        .expect("write fixture");

        let fixture = SeedFixture::load(Some(file.path())).expect("file fixture loads");
        assert_eq!(fixture.len(), 1);
        assert_eq!(
            fixture.source(),
            &FixtureSource::File(file.path().to_path_buf())
        );
        assert_eq!(fixture.documents()[0].name, "Monitor");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SeedFixture::from_path(Path::new("/nonexistent/devices.json"))
            .expect_err("missing file should error");
        assert!(matches!(err, FixtureError::Read { ref path, .. } if path.ends_with("devices.json")));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SeedFixture::from_json("{not json", FixtureSource::Builtin)
            .expect_err("malformed json should error");
        assert!(matches!(err, FixtureError::Decode(_)));
    }

    #[test]
    fn rejects_empty_fixture() {
        let err = SeedFixture::from_json("[]", FixtureSource::Builtin)
            .expect_err("empty fixture should error");
        assert!(matches!(err, FixtureError::Empty));
    }

    #[test]
    fn rejects_duplicate_device_ids() {
        let raw = r#"[
            {"id":"a","name":"A","deviceId":"1","warrantyUntil":"2030-01-01T00:00:00Z","price":1},
            {"id":"a","name":"B","deviceId":"2","warrantyUntil":"2030-01-01T00:00:00Z","price":2}
        ]"#;
        let err = SeedFixture::from_json(raw, FixtureSource::Builtin)
            .expect_err("duplicate ids should error");
        assert!(matches!(err, FixtureError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn rejects_blank_device_id() {
        let raw = r#"[{"id":" ","name":"A","deviceId":"1","warrantyUntil":"2030-01-01T00:00:00Z","price":1}]"#;
        let err = SeedFixture::from_json(raw, FixtureSource::Builtin)
            .expect_err("blank id should error");
        assert!(matches!(err, FixtureError::MissingId { index: 0 }));
    }

    #[test]
    fn rejects_negative_price() {
        let raw = r#"[{"id":"a","name":"A","deviceId":"1","warrantyUntil":"2030-01-01T00:00:00Z","price":-1}]"#;
        let err = SeedFixture::from_json(raw, FixtureSource::Builtin)
            .expect_err("negative price should error");
        assert!(matches!(err, FixtureError::InvalidPrice { .. }));
    }

    #[test]
    fn rejects_log_without_device() {
        let raw = r#"[{"id":"a","name":"A","deviceId":"1","warrantyUntil":"2030-01-01T00:00:00Z","price":1,
            "logList":[{"id":1,"text":"t","deviceId":"","createdAt":"2024-01-01T00:00:00Z"}]}]"#;
        let err = SeedFixture::from_json(raw, FixtureSource::Builtin)
            .expect_err("log without device should error");
        assert!(matches!(err, FixtureError::MissingLogDevice { log: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_log_ids() {
        let raw = r#"[{"id":"a","name":"A","deviceId":"1","warrantyUntil":"2030-01-01T00:00:00Z","price":1,
            "logList":[
                {"id":4,"text":"t","deviceId":"1","createdAt":"2024-01-01T00:00:00Z"},
                {"id":4,"text":"u","deviceId":"1","createdAt":"2024-01-02T00:00:00Z"}
            ]}]"#;
        let err = SeedFixture::from_json(raw, FixtureSource::Builtin)
            .expect_err("duplicate log ids should error");
        assert!(matches!(err, FixtureError::DuplicateLogId { log: 4, .. }));
    }
}
