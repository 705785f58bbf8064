//! File-backed reservation.
//!
//! A [`ReservationSnapshot`] serves reservation details exported to JSON, so
//! port plans can be checked offline:
//!
//! ```json
//! {
//!     "reservation_id": "4b6a1c2e",
//!     "resources": [
//!         {
//!             "name": "Ixia/M1/P1",
//!             "model": "Generic Traffic Generator Port",
//!             "full_address": "192.168.1.1/M1/P1",
//!             "attributes": { "Logical Name": "Port 1" }
//!         }
//!     ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use tgn_common::{ReservationApi, ReservationResource, TgnError, TgnResult};

/// One resource of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResource {
    pub name: String,
    pub model: String,
    pub full_address: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Serialized form of a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub reservation_id: String,
    #[serde(default)]
    pub resources: Vec<SnapshotResource>,
}

/// Reservation backed by a JSON snapshot.
///
/// Output messages are kept in memory. Uploads are written under
/// `upload_dir` when one is set.
#[derive(Debug, Default)]
pub struct ReservationSnapshot {
    data: SnapshotData,
    messages: Mutex<Vec<String>>,
    upload_dir: Option<PathBuf>,
}

impl ReservationSnapshot {
    /// Creates a snapshot from already parsed data.
    pub fn new(data: SnapshotData) -> Self {
        Self {
            data,
            messages: Mutex::new(Vec::new()),
            upload_dir: None,
        }
    }

    /// Loads a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> TgnResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let data: SnapshotData = serde_json::from_str(&content).map_err(|e| {
            TgnError::invalid_config(
                path.display().to_string(),
                format!("failed to parse reservation snapshot: {}", e),
            )
        })?;
        info!(
            "Loaded reservation {} with {} resources from {:?}",
            data.reservation_id,
            data.resources.len(),
            path
        );
        Ok(Self::new(data))
    }

    /// Writes uploads under `dir`.
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    /// Returns the snapshot's reservation id.
    pub fn reservation_id(&self) -> &str {
        &self.data.reservation_id
    }

    /// Returns the messages written to the reservation output so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    fn check_reservation(&self, operation: &str, reservation_id: &str) -> TgnResult<()> {
        if reservation_id != self.data.reservation_id {
            return Err(TgnError::reservation(
                operation,
                format!("unknown reservation '{}'", reservation_id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationApi for ReservationSnapshot {
    async fn get_reservation_details(
        &self,
        reservation_id: &str,
    ) -> TgnResult<Vec<ReservationResource>> {
        self.check_reservation("get_reservation_details", reservation_id)?;
        Ok(self
            .data
            .resources
            .iter()
            .map(|r| ReservationResource {
                name: r.name.clone(),
                model: r.model.clone(),
                full_address: r.full_address.clone(),
            })
            .collect())
    }

    async fn get_attribute_value(&self, resource: &str, attribute: &str) -> TgnResult<String> {
        let found = self
            .data
            .resources
            .iter()
            .find(|r| r.name == resource)
            .ok_or_else(|| {
                TgnError::reservation(
                    "get_attribute_value",
                    format!("unknown resource '{}'", resource),
                )
            })?;
        Ok(found.attributes.get(attribute).cloned().unwrap_or_default())
    }

    async fn write_message_to_reservation_output(
        &self,
        reservation_id: &str,
        message: &str,
    ) -> TgnResult<()> {
        self.check_reservation("write_message_to_reservation_output", reservation_id)?;
        info!("[{}] {}", reservation_id, message);
        self.messages.lock().push(message.to_string());
        Ok(())
    }

    async fn upload_file(
        &self,
        reservation_id: &str,
        filename: &str,
        content: &[u8],
    ) -> TgnResult<()> {
        self.check_reservation("upload_file", reservation_id)?;
        let dir = self.upload_dir.as_ref().ok_or_else(|| {
            TgnError::reservation("upload_file", "no upload directory configured")
        })?;

        let path = dir.join(filename);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| TgnError::reservation("upload_file", format!("{:?}: {}", path, e)))?;
        info!("Attached {} to reservation {}", filename, reservation_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::config::ReservationSettings;
    use crate::reconcile::fetch_reservation_ports;

    const SNAPSHOT: &str = r#"{
        "reservation_id": "4b6a1c2e",
        "resources": [
            {
                "name": "Ixia",
                "model": "Ixia Chassis Shell 2G",
                "full_address": "192.168.1.1"
            },
            {
                "name": "Ixia/M1/P1",
                "model": "Generic Traffic Generator Port",
                "full_address": "192.168.1.1/M1/P1",
                "attributes": { "Logical Name": "Port 1" }
            },
            {
                "name": "Ixia/M1/P2",
                "model": "Generic Traffic Generator Port",
                "full_address": "192.168.1.1/M1/P2",
                "attributes": {}
            }
        ]
    }"#;

    fn write_snapshot(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("reservation.json");
        fs::write(&path, SNAPSHOT).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_and_query() {
        let dir = TempDir::new().unwrap();
        let snapshot = ReservationSnapshot::load(write_snapshot(&dir)).unwrap();

        assert_eq!(snapshot.reservation_id(), "4b6a1c2e");
        let resources = snapshot.get_reservation_details("4b6a1c2e").await.unwrap();
        assert_eq!(resources.len(), 3);

        assert_eq!(
            snapshot
                .get_attribute_value("Ixia/M1/P1", "Logical Name")
                .await
                .unwrap(),
            "Port 1"
        );
        assert_eq!(
            snapshot
                .get_attribute_value("Ixia/M1/P2", "Logical Name")
                .await
                .unwrap(),
            ""
        );
    }

    #[tokio::test]
    async fn test_snapshot_ports() {
        let dir = TempDir::new().unwrap();
        let snapshot = ReservationSnapshot::load(write_snapshot(&dir)).unwrap();

        let ports =
            fetch_reservation_ports(&snapshot, "4b6a1c2e", &ReservationSettings::default())
                .await
                .unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].logical_name, "Port 1");
        assert!(!ports[1].has_logical_name());
    }

    #[tokio::test]
    async fn test_unknown_reservation() {
        let snapshot = ReservationSnapshot::new(SnapshotData {
            reservation_id: "r1".to_string(),
            resources: Vec::new(),
        });
        let err = snapshot.get_reservation_details("r2").await.unwrap_err();
        assert!(matches!(err, TgnError::Reservation { .. }));
    }

    #[tokio::test]
    async fn test_messages_recorded() {
        let snapshot = ReservationSnapshot::new(SnapshotData {
            reservation_id: "r1".to_string(),
            resources: Vec::new(),
        });
        snapshot
            .write_message_to_reservation_output("r1", "Quick test result = PASS")
            .await
            .unwrap();
        assert_eq!(snapshot.messages(), vec!["Quick test result = PASS"]);
    }

    #[tokio::test]
    async fn test_upload_written_to_dir() {
        let dir = TempDir::new().unwrap();
        let snapshot = ReservationSnapshot::new(SnapshotData {
            reservation_id: "r1".to_string(),
            resources: Vec::new(),
        })
        .with_upload_dir(dir.path());

        snapshot
            .upload_file("r1", "Port Statistics.csv", b"Port Name\r\nPort 1")
            .await
            .unwrap();

        let written = fs::read(dir.path().join("Port Statistics.csv")).unwrap();
        assert_eq!(written, b"Port Name\r\nPort 1");
    }

    #[tokio::test]
    async fn test_upload_without_dir_fails() {
        let snapshot = ReservationSnapshot::new(SnapshotData {
            reservation_id: "r1".to_string(),
            resources: Vec::new(),
        });
        assert!(snapshot.upload_file("r1", "a.csv", b"").await.is_err());
    }

    #[test]
    fn test_invalid_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ReservationSnapshot::load(&path),
            Err(TgnError::InvalidConfig { .. })
        ));
    }
}
