//! Report rendering: text tables per node category, client usage, and
//! the HTML digest body.
//!
//! Pure read-side rendering over a collected `Survey`. Volumes arrive in
//! kilobytes and are shown in MB with two decimals; percentages are
//! rounded here and nowhere earlier.

use std::fmt::Write as _;

use tabled::{Table, Tabled, settings::Style};

use meshly_core::model::Node;
use meshly_core::{Summary, Survey};

/// Returns an underlined version of the text supplied.
fn underline(text: &str) -> String {
    format!("{text}\n{}\n", "-".repeat(text.len()))
}

fn mb(kb: u64) -> String {
    format!("{:.2}", kb as f64 / 1000.0)
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.2}%"))
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Name\n(ID)")]
    name: String,
    #[tabled(rename = "Nodes")]
    nodes: String,
    #[tabled(rename = "Down\n(GW/Relay)")]
    down: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

#[derive(Tabled)]
struct GatewayRow {
    #[tabled(rename = "Name\n(Firmware)")]
    name: String,
    #[tabled(rename = "Clients")]
    clients: u32,
    #[tabled(rename = "DL MB\n(UL MB)")]
    usage: String,
    #[tabled(rename = "GW DL MB\n(GW UL MB)")]
    gateway_usage: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "IP Address")]
    ip: String,
}

#[derive(Tabled)]
struct RelayRow {
    #[tabled(rename = "Name\n(Firmware)")]
    name: String,
    #[tabled(rename = "Clients")]
    clients: u32,
    #[tabled(rename = "DL MB\n(UL MB)")]
    usage: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "Latency\n(Hops)")]
    latency: String,
}

#[derive(Tabled)]
struct SpareRow {
    #[tabled(rename = "Name\n(Firmware)")]
    name: String,
    #[tabled(rename = "Clients")]
    clients: u32,
    #[tabled(rename = "DL MB\n(UL MB)")]
    usage: String,
    #[tabled(rename = "IP Address")]
    ip: String,
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "Name\n(MAC)")]
    name: String,
    #[tabled(rename = "Last Node")]
    node: String,
    #[tabled(rename = "Blocked")]
    blocked: String,
    #[tabled(rename = "DL MB")]
    download: String,
    #[tabled(rename = "UL MB")]
    upload: String,
    #[tabled(rename = "Seen")]
    observations: u32,
}

fn name_with(node_name: Option<&str>, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{}\n({d})", dash(node_name)),
        None => dash(node_name),
    }
}

fn usage_pair(download_kb: u64, upload_kb: u64) -> String {
    format!("{}\n({})", mb(download_kb), mb(upload_kb))
}

// ── Node report ──────────────────────────────────────────────────────

/// Render the three per-category node tables, with an omission warning
/// when any node's status code was unrecognized.
pub fn render_nodes(survey: &Survey) -> String {
    let mut gateways = Vec::new();
    let mut relays = Vec::new();
    let mut spares = Vec::new();

    for node in survey.nodes() {
        if node.is_spare() {
            spares.push(spare_row(node));
        } else if node.is_gateway() {
            gateways.push(gateway_row(node));
        } else if node.is_relay() {
            relays.push(relay_row(node));
        }
    }

    let mut out = underline("Usage for the last 24 hours");
    let _ = write!(
        out,
        "\nGateway nodes\n{}\n\nRelay nodes\n{}\n\nSpare nodes\n{}\n",
        Table::new(gateways).with(Style::rounded()),
        Table::new(relays).with(Style::rounded()),
        Table::new(spares).with(Style::rounded()),
    );

    let omitted = survey.omitted();
    if omitted > 0 {
        let _ = write!(out, "\nWarning: {omitted} nodes were omitted from this report\n");
    }
    out
}

fn gateway_row(node: &Node) -> GatewayRow {
    GatewayRow {
        name: name_with(node.name.as_deref(), node.firmware_version.as_deref()),
        clients: node.usage.clients,
        usage: usage_pair(node.usage.download_kb, node.usage.upload_kb),
        gateway_usage: usage_pair(node.usage.gateway_download_kb, node.usage.gateway_upload_kb),
        uptime: pct(node.timeline.as_ref().map(|t| t.gateway_pct)),
        ip: dash(node.ip.as_deref()),
    }
}

fn relay_row(node: &Node) -> RelayRow {
    let latency = match (node.latency_ms, node.hops) {
        (Some(ms), Some(hops)) => format!("{ms}ms\n({hops})"),
        (Some(ms), None) => format!("{ms}ms"),
        _ => "-".into(),
    };
    RelayRow {
        name: name_with(node.name.as_deref(), node.firmware_version.as_deref()),
        clients: node.usage.clients,
        usage: usage_pair(node.usage.download_kb, node.usage.upload_kb),
        gateway: dash(node.gateway_name.as_deref()),
        uptime: pct(node.timeline.as_ref().map(|t| t.relay_pct)),
        latency,
    }
}

fn spare_row(node: &Node) -> SpareRow {
    SpareRow {
        name: name_with(node.name.as_deref(), node.firmware_version.as_deref()),
        clients: node.usage.clients,
        usage: usage_pair(node.usage.download_kb, node.usage.upload_kb),
        ip: dash(node.ip.as_deref()),
    }
}

// ── Network and client reports ───────────────────────────────────────

pub fn render_networks(survey: &Survey) -> String {
    let rows: Vec<NetworkRow> = survey
        .networks()
        .map(|net| NetworkRow {
            name: format!("{}\n({})", net.name, net.id),
            nodes: net
                .node_count
                .map_or_else(|| "-".into(), |n| n.to_string()),
            down: format!(
                "{}/{}",
                net.down_gateway.unwrap_or(0),
                net.down_repeater.unwrap_or(0)
            ),
            firmware: dash(net.latest_firmware_version.as_deref()),
        })
        .collect();

    format!(
        "{}\n{}\n",
        underline("Networks"),
        Table::new(rows).with(Style::rounded())
    )
}

pub fn render_clients(survey: &Survey) -> String {
    let rows: Vec<ClientRow> = survey
        .clients()
        .map(|client| ClientRow {
            name: format!("{}\n({})", dash(client.name.as_deref()), client.mac),
            node: client.node_name.clone().unwrap_or_else(|| {
                client
                    .node_mac
                    .as_ref()
                    .map_or_else(|| dash(None), ToString::to_string)
            }),
            blocked: match client.blocked {
                Some(true) => "yes".into(),
                Some(false) => "no".into(),
                None => "-".into(),
            },
            download: mb(client.download_kb),
            upload: mb(client.upload_kb),
            observations: client.observations,
        })
        .collect();

    format!(
        "{}\n{}\n",
        underline("Connected clients, last 24 hours"),
        Table::new(rows).with(Style::rounded())
    )
}

// ── Summary ──────────────────────────────────────────────────────────

pub fn render_summary(summary: &Summary) -> String {
    let mut out = underline("Collection summary");
    let _ = write!(
        out,
        "\nNetworks:  {}\nNodes:     {} ({} alerting, {} omitted)\nClients:   {}\nDownload:  {:.2} MB\nUpload:    {:.2} MB\n",
        summary.networks,
        summary.nodes,
        summary.alerting,
        summary.omitted,
        summary.clients,
        summary.total_download_mb,
        summary.total_upload_mb,
    );
    out
}

// ── HTML digest ──────────────────────────────────────────────────────

/// Render the digest as a self-contained HTML body, suitable for handing
/// to a mail collaborator.
pub fn render_html_digest(survey: &Survey) -> String {
    let summary = survey.summary();
    let mut out = String::from("<html><body>\n<h1>Mesh usage digest</h1>\n");

    let _ = write!(
        out,
        "<p>{} networks, {} nodes ({} alerting), {} clients. \
         Total {:.2} MB down / {:.2} MB up.</p>\n",
        summary.networks,
        summary.nodes,
        summary.alerting,
        summary.clients,
        summary.total_download_mb,
        summary.total_upload_mb,
    );

    out.push_str("<table border=\"1\">\n<tr><th>Node</th><th>Role</th><th>Clients</th><th>DL MB</th><th>UL MB</th><th>GW DL MB</th></tr>\n");
    for node in survey.nodes() {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(node.name.as_deref().unwrap_or("-")),
            node.role
                .map_or_else(|| "unknown".into(), |r| r.to_string()),
            node.usage.clients,
            mb(node.usage.download_kb),
            mb(node.usage.upload_kb),
            mb(node.usage.gateway_download_kb),
        );
    }
    out.push_str("</table>\n</body></html>\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
