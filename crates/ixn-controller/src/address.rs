//! Physical port address normalization.
//!
//! Reservation inventories report full addresses such as
//! `192.168.1.1/M1/PG1/P2` or `10.1.2.3/Module1/Port2PG1`. The traffic
//! generator expects `chassis/module/port`, so protocol-group components are
//! dropped and short `M<n>`/`P<n>` segment names collapse to their number.
//! Anything after the port number that starts with a delimiter
//! (`2-GroupA`, `2 (PG1)`) is a protocol-group label and is dropped too.

use once_cell::sync::Lazy;
use regex::Regex;

/// Protocol-group suffix of a segment, optionally behind a delimiter.
static PROTOCOL_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^A-Za-z0-9]?PG\d+$").expect("Invalid regex pattern"));

/// Free-text label following the port number of the last segment.
static PORT_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]*\d+)[^A-Za-z0-9].*$").expect("Invalid regex pattern"));

/// Short module/port segment names (`M1`, `P12`).
static SHORT_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[MP](\d+)$").expect("Invalid regex pattern"));

/// Normalizes a reservation full address to `chassis/module/port` form.
///
/// # Example
///
/// ```
/// use ixn_controller::address::normalize_physical_address;
///
/// assert_eq!(
///     normalize_physical_address("10.1.2.3/Module1/Port2PG1"),
///     "10.1.2.3/Module1/Port2"
/// );
/// assert_eq!(normalize_physical_address("192.168.1.1/M1/PG1/P2"), "192.168.1.1/1/2");
/// ```
pub fn normalize_physical_address(full_address: &str) -> String {
    let segments: Vec<&str> = full_address.trim().split('/').map(str::trim).collect();
    let last = segments.len() - 1;

    let mut normalized = Vec::with_capacity(segments.len());
    for (i, segment) in segments.into_iter().enumerate() {
        let segment = if i == last {
            PORT_LABEL_RE.replace(segment, "$1")
        } else {
            segment.into()
        };
        let segment = PROTOCOL_GROUP_RE.replace(&segment, "");
        if segment.is_empty() {
            continue;
        }
        normalized.push(SHORT_SEGMENT_RE.replace(&segment, "$1").into_owned());
    }
    normalized.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_address_unchanged() {
        assert_eq!(normalize_physical_address("10.0.0.1/1/1"), "10.0.0.1/1/1");
        assert_eq!(normalize_physical_address(" 10.0.0.1/1/2 "), "10.0.0.1/1/2");
    }

    #[test]
    fn test_suffix_appended_to_port() {
        assert_eq!(
            normalize_physical_address("10.1.2.3/Module1/Port2PG1"),
            "10.1.2.3/Module1/Port2"
        );
    }

    #[test]
    fn test_suffix_behind_delimiter() {
        assert_eq!(normalize_physical_address("10.0.0.1/1/2-PG3"), "10.0.0.1/1/2");
        assert_eq!(normalize_physical_address("10.0.0.1/1/2_PG12"), "10.0.0.1/1/2");
    }

    #[test]
    fn test_free_text_label_after_port() {
        assert_eq!(normalize_physical_address("10.0.0.1/1/2-GroupA"), "10.0.0.1/1/2");
        assert_eq!(normalize_physical_address("10.0.0.1/1/2 (PG1)"), "10.0.0.1/1/2");
        assert_eq!(normalize_physical_address("10.0.0.1/1/2 PG 1"), "10.0.0.1/1/2");
        assert_eq!(
            normalize_physical_address("10.1.2.3/Module1/Port2 - BGP peers"),
            "10.1.2.3/Module1/Port2"
        );
    }

    #[test]
    fn test_lowercase_protocol_group() {
        assert_eq!(normalize_physical_address("10.0.0.1/1/2-pg1"), "10.0.0.1/1/2");
        assert_eq!(
            normalize_physical_address("10.1.2.3/Module1/Port2pg4"),
            "10.1.2.3/Module1/Port2"
        );
        assert_eq!(normalize_physical_address("192.168.1.1/M1/pg1/P2"), "192.168.1.1/1/2");
    }

    #[test]
    fn test_protocol_group_segment_dropped() {
        assert_eq!(
            normalize_physical_address("192.168.1.1/M1/PG1/P2"),
            "192.168.1.1/1/2"
        );
    }

    #[test]
    fn test_long_segment_names_kept() {
        assert_eq!(
            normalize_physical_address("ixia 2g/Module2/Port2"),
            "ixia 2g/Module2/Port2"
        );
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(normalize_physical_address(""), "");
        assert_eq!(normalize_physical_address("PG1"), "");
    }
}
