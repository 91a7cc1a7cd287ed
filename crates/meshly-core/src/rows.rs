// Dashboard row schemas.
//
// The legacy dashboard renders nodes and users as HTML tables; the
// distiller (meshly-api::html) hands us rows of cell-fragment lists.
// Each expected row shape is described here as a schema naming the field
// at every cell index, and decoding validates against it -- a malformed
// row becomes a typed error naming the violated field, never an
// index-out-of-range panic.
//
// Value-level telemetry (latency, load, signal) is decoded tolerantly:
// dashboards render placeholders like "-" for fields that don't apply,
// and those decode to absent. Only the usage volumes are strict, because
// they feed aggregation.

use meshly_api::html::Row;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Client, MacAddress, Node, NodeKey, NodeStatus};

/// Named cell layout of one table row shape.
struct RowSchema {
    context: &'static str,
    cells: &'static [&'static str],
}

impl RowSchema {
    /// Validate the cell count against the schema.
    fn check(&self, row: &Row) -> Result<(), CoreError> {
        if row.len() < self.cells.len() {
            return Err(CoreError::RowShape {
                context: self.context,
                expected: self.cells.len(),
                got: row.len(),
            });
        }
        Ok(())
    }

    fn field(&self, cell: usize) -> &'static str {
        self.cells.get(cell).copied().unwrap_or("unknown")
    }

    /// A required fragment of a cell.
    fn frag<'a>(&self, row: &'a Row, cell: usize, frag: usize) -> Result<&'a str, CoreError> {
        self.opt_frag(row, cell, frag)
            .ok_or(CoreError::MissingField {
                context: self.context,
                field: self.field(cell),
            })
    }

    /// A required *last* fragment of a cell.
    fn last_frag<'a>(&self, row: &'a Row, cell: usize) -> Result<&'a str, CoreError> {
        row.get(cell)
            .and_then(|c| c.last())
            .map(String::as_str)
            .ok_or(CoreError::MissingField {
                context: self.context,
                field: self.field(cell),
            })
    }

    fn opt_frag<'a>(&self, row: &'a Row, cell: usize, frag: usize) -> Option<&'a str> {
        row.get(cell).and_then(|c| c.get(frag)).map(String::as_str)
    }

    /// All fragments of a cell joined with spaces (for prose cells that
    /// the dashboard sometimes splits across elements).
    fn joined(&self, row: &Row, cell: usize) -> Option<String> {
        row.get(cell)
            .filter(|c| !c.is_empty())
            .map(|c| c.join(" "))
    }

    /// A strict kilobyte count: tolerates thousands separators, errors on
    /// anything else.
    fn volume_kb(&self, row: &Row, cell: usize) -> Result<u64, CoreError> {
        let raw = self.frag(row, cell, 0)?;
        parse_count(raw).ok_or_else(|| CoreError::FieldValue {
            context: self.context,
            field: self.field(cell),
            value: raw.to_owned(),
        })
    }
}

/// Parse a count that may carry thousands separators ("1,234").
fn parse_count(raw: &str) -> Option<u64> {
    let cleaned = raw.replace(',', "");
    cleaned
        .parse::<u64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

fn parse_opt<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.replace(',', "").parse().ok())
}

// ── Node status rows ────────────────────────────────────────────────

const NODE_ROW: RowSchema = RowSchema {
    context: "node status",
    cells: &[
        "status code",
        "name",
        "addresses",
        "channels",
        "client count",
        "usage",
        "uptime",
        "firmware",
        "system",
        "last checkin",
        "gateway",
        "hops",
        "latency",
    ],
};

/// Decode one distilled node-status row.
///
/// An unrecognized status code leaves `role` unset -- the caller counts the
/// node as omitted from categorized reporting but still keeps the record.
pub fn node_from_status_row(network: &str, row: &Row) -> Result<Node, CoreError> {
    NODE_ROW.check(row)?;

    let code = NODE_ROW.frag(row, 0, 0)?;
    let status = NodeStatus::from_dashboard_code(code);
    if status.is_none() {
        debug!(code, "unrecognized node status code");
    }

    let mac = MacAddress::new(NODE_ROW.frag(row, 2, 0)?);
    let mut node = Node::new(NodeKey::Mac(mac.clone()), network);
    node.mac = Some(mac);

    node.role = status.map(|s| s.role);
    node.down = status.is_some_and(|s| s.state == crate::model::LinkState::Down);
    node.spare = status.is_some_and(|s| s.role == crate::model::NodeRole::Spare);

    node.name = Some(NODE_ROW.frag(row, 1, 0)?.to_owned());
    if row.get(1).is_some_and(|c| c.len() > 1) {
        node.description = NODE_ROW.opt_frag(row, 1, row[1].len() - 1).map(str::to_owned);
    }

    node.ip = NODE_ROW.opt_frag(row, 2, 1).map(str::to_owned);
    node.channel_24 = NODE_ROW.opt_frag(row, 3, 0).map(str::to_owned);
    node.channel_58 = NODE_ROW.opt_frag(row, 3, 1).map(str::to_owned);
    node.reported_clients = parse_opt(NODE_ROW.opt_frag(row, 4, 0));
    node.reported_download_kb = NODE_ROW.opt_frag(row, 5, 0).and_then(parse_count);
    node.reported_upload_kb = NODE_ROW.opt_frag(row, 5, 1).and_then(parse_count);
    node.uptime = NODE_ROW.opt_frag(row, 6, 0).map(str::to_owned);
    node.firmware_version = NODE_ROW.opt_frag(row, 7, 0).map(str::to_owned);
    if row.get(7).is_some_and(|c| c.len() > 1) {
        node.firmware_name = NODE_ROW.opt_frag(row, 7, row[7].len() - 1).map(str::to_owned);
    }
    node.load = parse_opt(NODE_ROW.opt_frag(row, 8, 0));
    node.memfree = parse_opt(NODE_ROW.opt_frag(row, 8, 1));
    node.last_checkin_desc = NODE_ROW.joined(row, 9);
    node.gateway_name = NODE_ROW.opt_frag(row, 10, 0).map(str::to_owned);
    if row.get(10).is_some_and(|c| c.len() > 1) {
        node.gateway_ip = NODE_ROW.opt_frag(row, 10, row[10].len() - 1).map(str::to_owned);
    }
    node.hops = parse_opt(NODE_ROW.opt_frag(row, 11, 0));
    node.latency_ms = parse_opt(NODE_ROW.opt_frag(row, 12, 0));

    Ok(node)
}

// ── User rows ───────────────────────────────────────────────────────

const USER_ROW: RowSchema = RowSchema {
    context: "user",
    cells: &[
        "client",
        "node",
        "vendor",
        "signal",
        "rate",
        "download",
        "upload",
        "quota",
        "blocked",
    ],
};

/// Decode one distilled connected-user row into a single-observation
/// client record.
pub fn client_from_usage_row(network: &str, row: &Row) -> Result<Client, CoreError> {
    USER_ROW.check(row)?;

    let mac = MacAddress::new(USER_ROW.last_frag(row, 0)?);
    let mut client = Client::new(mac, network);

    // The name shares a cell with the MAC and is optional.
    if row.first().is_some_and(|c| c.len() > 1) {
        client.name = USER_ROW.opt_frag(row, 0, 0).map(str::to_owned);
    }

    client.node_mac = Some(MacAddress::new(USER_ROW.last_frag(row, 1)?));
    if row.get(1).is_some_and(|c| c.len() > 1) {
        client.node_name = USER_ROW.opt_frag(row, 1, 0).map(str::to_owned);
    }

    client.signal = parse_opt(USER_ROW.opt_frag(row, 3, 0));
    client.rate = USER_ROW.opt_frag(row, 4, 0).map(str::to_owned);
    if row.get(4).is_some_and(|c| c.len() > 1) {
        client.mcs = USER_ROW.opt_frag(row, 4, row[4].len() - 1).map(str::to_owned);
    }

    client.download_kb = USER_ROW.volume_kb(row, 5)?;
    client.upload_kb = USER_ROW.volume_kb(row, 6)?;

    client.blocked = USER_ROW
        .opt_frag(row, 8, 0)
        .map(|b| matches!(b.to_ascii_lowercase().as_str(), "yes" | "true" | "blocked"));

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeRole;

    fn cell(frags: &[&str]) -> Vec<String> {
        frags.iter().map(|s| (*s).to_owned()).collect()
    }

    fn node_row() -> Row {
        vec![
            cell(&["4"]),
            cell(&["attic-relay", "west wing"]),
            cell(&["AA:00:00:00:00:02", "10.0.0.12"]),
            cell(&["6", "149"]),
            cell(&["3"]),
            cell(&["12,480", "2,016"]),
            cell(&["4 days"]),
            cell(&["6.2.1", "stable"]),
            cell(&["0.41", "23812"]),
            cell(&["2 minutes ago"]),
            cell(&["front-gate", "10.0.0.1"]),
            cell(&["2"]),
            cell(&["11"]),
        ]
    }

    #[test]
    fn decodes_a_full_node_row() {
        let node = node_from_status_row("lakeside", &node_row()).expect("decode");

        assert_eq!(node.name.as_deref(), Some("attic-relay"));
        assert_eq!(node.description.as_deref(), Some("west wing"));
        assert_eq!(node.role, Some(NodeRole::Relay));
        assert!(!node.down);
        assert_eq!(
            node.mac.as_ref().map(MacAddress::as_str),
            Some("aa:00:00:00:00:02")
        );
        assert_eq!(node.ip.as_deref(), Some("10.0.0.12"));
        assert_eq!(node.reported_clients, Some(3));
        assert_eq!(node.reported_download_kb, Some(12_480));
        assert_eq!(node.reported_upload_kb, Some(2_016));
        assert_eq!(node.gateway_name.as_deref(), Some("front-gate"));
        assert_eq!(node.hops, Some(2));
        assert_eq!(node.latency_ms, Some(11));
    }

    #[test]
    fn down_code_sets_down_flag() {
        let mut row = node_row();
        row[0] = cell(&["2"]);
        let node = node_from_status_row("lakeside", &row).expect("decode");
        assert!(node.down);
        assert_eq!(node.role, Some(NodeRole::Relay));
    }

    #[test]
    fn unknown_status_code_keeps_the_node_uncategorized() {
        let mut row = node_row();
        row[0] = cell(&["9"]);
        let node = node_from_status_row("lakeside", &row).expect("decode");
        assert!(node.role.is_none());
        assert!(!node.down);
    }

    #[test]
    fn short_row_is_a_shape_error() {
        let row: Row = vec![cell(&["4"]), cell(&["name"])];
        let err = node_from_status_row("lakeside", &row).expect_err("shape");
        assert!(matches!(
            err,
            CoreError::RowShape {
                expected: 13,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn placeholder_telemetry_decodes_to_absent() {
        let mut row = node_row();
        row[11] = cell(&["-"]);
        row[12] = cell(&["-"]);
        let node = node_from_status_row("lakeside", &row).expect("decode");
        assert_eq!(node.hops, None);
        assert_eq!(node.latency_ms, None);
    }

    fn user_row() -> Row {
        vec![
            cell(&["kims-laptop", "CC:00:00:00:00:01"]),
            cell(&["attic-relay", "AA:00:00:00:00:02"]),
            cell(&["Example Vendor"]),
            cell(&["-61"]),
            cell(&["65M", "MCS 7"]),
            cell(&["1,234"]),
            cell(&["567"]),
            cell(&[]),
            cell(&["No"]),
        ]
    }

    #[test]
    fn decodes_a_full_user_row() {
        let client = client_from_usage_row("lakeside", &user_row()).expect("decode");

        assert_eq!(client.mac.as_str(), "cc:00:00:00:00:01");
        assert_eq!(client.name.as_deref(), Some("kims-laptop"));
        assert_eq!(
            client.node_mac.as_ref().map(MacAddress::as_str),
            Some("aa:00:00:00:00:02")
        );
        assert_eq!(client.node_name.as_deref(), Some("attic-relay"));
        assert_eq!(client.signal, Some(-61));
        assert_eq!(client.download_kb, 1_234);
        assert_eq!(client.upload_kb, 567);
        assert_eq!(client.blocked, Some(false));
        assert_eq!(client.observations, 1);
    }

    #[test]
    fn anonymous_client_has_no_name() {
        let mut row = user_row();
        row[0] = cell(&["CC:00:00:00:00:09"]);
        let client = client_from_usage_row("lakeside", &row).expect("decode");
        assert_eq!(client.mac.as_str(), "cc:00:00:00:00:09");
        assert!(client.name.is_none());
    }

    #[test]
    fn garbage_volume_is_a_field_error() {
        let mut row = user_row();
        row[5] = cell(&["lots"]);
        let err = client_from_usage_row("lakeside", &row).expect_err("volume");
        assert!(matches!(
            err,
            CoreError::FieldValue {
                field: "download",
                ..
            }
        ));
    }
}
