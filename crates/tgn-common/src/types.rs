//! Data model shared between the driver and its collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attributes::FLOW_STATISTICS_VIEW;
use crate::error::TgnError;

/// A port object declared inside a loaded traffic configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPort {
    /// User-assigned logical name (e.g., "Port 1").
    pub name: String,
    /// Opaque client-side object reference for this port.
    pub handle: String,
}

impl LogicalPort {
    /// Creates a new logical port.
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.into(),
        }
    }
}

/// A resource attached to a reservation, as reported by the reservation
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationResource {
    /// Full resource name (e.g., "Ixia Chassis/Module1/Port1").
    pub name: String,
    /// Resource model name.
    pub model: String,
    /// Full physical address of the resource.
    pub full_address: String,
}

/// A physical traffic-generator port attached to a reservation, with its
/// user-set logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPort {
    /// Resource name in the reservation.
    pub resource_name: String,
    /// Raw physical address from the inventory.
    pub full_address: String,
    /// Value of the logical name attribute; empty when unset.
    pub logical_name: String,
}

impl ReservationPort {
    /// Creates a new reservation port.
    pub fn new(
        resource_name: impl Into<String>,
        full_address: impl Into<String>,
        logical_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            full_address: full_address.into(),
            logical_name: logical_name.into(),
        }
    }

    /// Returns true if this port may take part in binding.
    pub fn has_logical_name(&self) -> bool {
        !self.logical_name.trim().is_empty()
    }
}

/// Result of reconciling a logical port with a reservation port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// Logical port name, as declared in the configuration.
    pub logical_name: String,
    /// Normalized `chassis/module/port` address.
    pub physical_address: String,
}

/// Statistics values of one row, keyed by caption.
pub type StatisticsRow = BTreeMap<String, String>;

/// One named row of a statistics view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsEntry {
    /// Row key (the object the counters belong to, e.g. a port name).
    pub name: String,
    /// Values keyed by caption.
    pub values: StatisticsRow,
}

/// A statistics view read from the traffic generator.
///
/// Caption order is column order and row order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsTable {
    /// Column captions in view order.
    pub captions: Vec<String>,
    /// Rows in view order.
    #[serde(default)]
    pub rows: Vec<StatisticsEntry>,
}

impl StatisticsTable {
    /// Creates an empty table with the given captions.
    pub fn new<I, S>(captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            captions: captions.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds a row. A row with the same key is replaced in place.
    pub fn push_row(&mut self, name: impl Into<String>, values: StatisticsRow) {
        let name = name.into();
        match self.rows.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.values = values,
            None => self.rows.push(StatisticsEntry { name, values }),
        }
    }

    /// Builder-style variant of [`StatisticsTable::push_row`].
    pub fn with_row<I, K, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.push_row(name, values);
        self
    }

    /// Gets a row by key.
    pub fn get(&self, name: &str) -> Option<&StatisticsRow> {
        self.rows
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.values)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which statistics view to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatisticsView {
    /// Per-flow traffic item statistics.
    Flow,
    /// Any other view, by caption (e.g., "Port Statistics").
    Named(String),
}

impl StatisticsView {
    /// Maps a user-facing view name to a view.
    pub fn from_name(name: &str) -> Self {
        if name == FLOW_STATISTICS_VIEW {
            StatisticsView::Flow
        } else {
            StatisticsView::Named(name.to_string())
        }
    }

    /// Returns the view caption.
    pub fn name(&self) -> &str {
        match self {
            StatisticsView::Flow => FLOW_STATISTICS_VIEW,
            StatisticsView::Named(name) => name,
        }
    }
}

impl fmt::Display for StatisticsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendering of statistics returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Json,
    Csv,
}

impl OutputKind {
    /// File extension used for attachments.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Json => "json",
            OutputKind::Csv => "csv",
        }
    }
}

impl FromStr for OutputKind {
    type Err = TgnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputKind::Json),
            "csv" => Ok(OutputKind::Csv),
            _ => Err(TgnError::UnsupportedFormat {
                kind: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reservation_port_logical_name() {
        assert!(ReservationPort::new("c/M1/P1", "10.0.0.1/1/1", "Port 1").has_logical_name());
        assert!(!ReservationPort::new("c/M1/P2", "10.0.0.1/1/2", "").has_logical_name());
        assert!(!ReservationPort::new("c/M1/P3", "10.0.0.1/1/3", "   ").has_logical_name());
    }

    #[test]
    fn test_statistics_table_rows_keep_order() {
        let table = StatisticsTable::new(["Port Name", "Frames Tx."])
            .with_row("Port 2", [("Frames Tx.", "10")])
            .with_row("Port 1", [("Frames Tx.", "20")]);

        let names: Vec<_> = table.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Port 2", "Port 1"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_statistics_table_replaces_same_key() {
        let table = StatisticsTable::new(["Frames Tx."])
            .with_row("Port 1", [("Frames Tx.", "1")])
            .with_row("Port 1", [("Frames Tx.", "2")]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("Port 1").and_then(|r| r.get("Frames Tx.")),
            Some(&"2".to_string())
        );
    }

    #[test]
    fn test_statistics_table_deserialize() {
        let json = r#"{
            "captions": ["Port Name", "Frames Tx."],
            "rows": [{"name": "Port 1", "values": {"Frames Tx.": "1600"}}]
        }"#;
        let table: StatisticsTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.captions, vec!["Port Name", "Frames Tx."]);
        assert_eq!(table.get("Port 1").unwrap()["Frames Tx."], "1600");
    }

    #[test]
    fn test_statistics_view_from_name() {
        assert_eq!(
            StatisticsView::from_name("Flow Statistics"),
            StatisticsView::Flow
        );
        assert_eq!(
            StatisticsView::from_name("Port Statistics"),
            StatisticsView::Named("Port Statistics".to_string())
        );
        assert_eq!(StatisticsView::Flow.to_string(), "Flow Statistics");
    }

    #[test]
    fn test_output_kind_parse() {
        assert_eq!("json".parse::<OutputKind>().unwrap(), OutputKind::Json);
        assert_eq!(" JSON ".parse::<OutputKind>().unwrap(), OutputKind::Json);
        assert_eq!("Csv\n".parse::<OutputKind>().unwrap(), OutputKind::Csv);
    }

    #[test]
    fn test_output_kind_rejects_unknown() {
        for kind in ["xml", " XML ", "", "json5", "c s v"] {
            match kind.parse::<OutputKind>() {
                Err(TgnError::UnsupportedFormat { kind: k }) => assert_eq!(k, kind),
                other => panic!("Expected UnsupportedFormat for {kind:?}, got {other:?}"),
            }
        }
    }
}
