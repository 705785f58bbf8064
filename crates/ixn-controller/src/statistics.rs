//! Statistics rendering and delivery.
//!
//! A view read from the traffic generator is rendered either as JSON
//! (object keyed by row, then by caption, keys sorted, 4-space indent) or
//! as CSV (captions as header, one line per row), then forwarded to the
//! reservation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use tgn_common::{OutputKind, ReservationApi, StatisticsRow, StatisticsTable, TgnError, TgnResult};

/// Renders a statistics table.
pub fn format_statistics(table: &StatisticsTable, kind: OutputKind) -> TgnResult<String> {
    match kind {
        OutputKind::Json => render_json(table),
        OutputKind::Csv => render_csv(table),
    }
}

/// Renders a statistics table for a user-supplied output kind.
///
/// The kind is matched case-insensitively after trimming; anything other
/// than `json` or `csv` fails with [`TgnError::UnsupportedFormat`].
pub fn format_statistics_as(table: &StatisticsTable, output_kind: &str) -> TgnResult<String> {
    format_statistics(table, output_kind.parse()?)
}

fn render_json(table: &StatisticsTable) -> TgnResult<String> {
    let rows: BTreeMap<&str, &StatisticsRow> = table
        .rows
        .iter()
        .map(|entry| (entry.name.as_str(), &entry.values))
        .collect();

    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    rows.serialize(&mut serializer)
        .map_err(|e| TgnError::internal(format!("Failed to render statistics as JSON: {}", e)))?;

    String::from_utf8(out).map_err(|e| TgnError::internal(e.to_string()))
}

fn render_csv(table: &StatisticsTable) -> TgnResult<String> {
    if table.captions.is_empty() {
        return Ok(String::new());
    }

    let csv_err =
        |e: csv::Error| TgnError::internal(format!("Failed to render statistics as CSV: {}", e));

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&table.captions).map_err(csv_err)?;
    for entry in &table.rows {
        writer
            .write_record(table.captions.iter().map(|caption| {
                entry
                    .values
                    .get(caption)
                    .map(String::as_str)
                    .unwrap_or("")
            }))
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TgnError::internal(format!("Failed to flush CSV writer: {}", e)))?;
    let text = String::from_utf8(bytes).map_err(|e| TgnError::internal(e.to_string()))?;

    Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Channel rendered statistics are forwarded to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsDelivery {
    /// Reservation output window.
    #[default]
    Output,
    /// File attached to the reservation, named after the view.
    Attachment,
}

/// Attachment file name for a view.
pub fn attachment_name(view_name: &str, kind: OutputKind) -> String {
    format!("{}.{}", view_name.trim(), kind.extension())
}

/// Forwards rendered statistics to the reservation.
///
/// Failures of the reservation service are surfaced as
/// [`TgnError::SinkWrite`].
pub async fn deliver_statistics<R>(
    api: &R,
    delivery: StatisticsDelivery,
    reservation_id: &str,
    view_name: &str,
    kind: OutputKind,
    content: &str,
) -> TgnResult<()>
where
    R: ReservationApi + ?Sized,
{
    match delivery {
        StatisticsDelivery::Output => {
            debug!("Writing {} statistics to reservation output", view_name);
            api.write_message_to_reservation_output(reservation_id, content)
                .await
                .map_err(|e| TgnError::sink("reservation output", e.to_string()))
        }
        StatisticsDelivery::Attachment => {
            let filename = attachment_name(view_name, kind);
            debug!("Attaching {} to reservation {}", filename, reservation_id);
            api.upload_file(reservation_id, &filename, content.as_bytes())
                .await
                .map_err(|e| TgnError::sink(format!("attachment {}", filename), e.to_string()))
        }
    }
}
