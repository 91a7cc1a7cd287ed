//! Builds the configured collection surface and runs a full survey.
//!
//! The signed API wins when both surfaces are configured; the legacy
//! dashboard is the fallback for deployments that never got API keys.

use std::time::Duration;

use meshly_api::{DashboardPages, SessionClient, SignedClient, TlsMode, TransportConfig};
use meshly_core::model::{AlertPolicy, AlertTrigger};
use meshly_core::{AggregationPolicy, Collector, DashboardCollector, Survey};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn collect(global: &GlobalOpts) -> Result<Survey, CliError> {
    let cfg = meshly_config::load_config(global.config.as_ref())?;

    let policy = AggregationPolicy {
        alert: AlertPolicy {
            trigger: if global.alert_offline {
                AlertTrigger::OfflineTime
            } else {
                AlertTrigger::DownFlag
            },
            include_spares: global.alert_spares,
        },
        count_self_traffic: global.count_self_traffic,
    };

    let transport = TransportConfig {
        tls: if global.insecure || cfg.defaults.insecure {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        },
        timeout: Duration::from_secs(global.timeout),
        ..TransportConfig::default()
    };

    if let Some(profile) = cfg.api.as_ref() {
        return collect_signed(global, profile, policy, &transport).await;
    }
    if let Some(profile) = cfg.dashboard.as_ref() {
        return collect_dashboard(global, profile, policy, &transport).await;
    }

    Err(CliError::NoSurface {
        path: global
            .config
            .clone()
            .unwrap_or_else(meshly_config::config_path)
            .display()
            .to_string(),
    })
}

async fn collect_signed(
    global: &GlobalOpts,
    profile: &meshly_config::ApiProfile,
    policy: AggregationPolicy,
    transport: &TransportConfig,
) -> Result<Survey, CliError> {
    let (key, secret) = meshly_config::resolve_api_credentials(profile)?;
    let base_url = meshly_config::parse_base_url(&profile.url)?;
    let client = SignedClient::new(base_url, key, secret, profile.version.clone(), transport)?;

    let mut collector =
        Collector::new(client, policy).with_period(global.period.as_str());

    collector.collect_networks().await?;
    if let Some(name) = &global.network {
        collector.scope_to_network(name);
    }
    collector.collect_nodes().await?;
    collector.collect_node_history().await?;
    collector.collect_clients().await?;

    Ok(collector.into_survey())
}

async fn collect_dashboard(
    global: &GlobalOpts,
    profile: &meshly_config::DashboardProfile,
    policy: AggregationPolicy,
    transport: &TransportConfig,
) -> Result<Survey, CliError> {
    let (username, password) = meshly_config::resolve_dashboard_credentials(profile)?;
    let base_url = meshly_config::parse_base_url(&profile.url)?;

    let mut pages = DashboardPages::default();
    if let Some(p) = &profile.login_page {
        pages.login.clone_from(p);
    }
    if let Some(p) = &profile.status_page {
        pages.status.clone_from(p);
    }
    if let Some(p) = &profile.users_page {
        pages.users.clone_from(p);
    }
    if let Some(p) = &profile.graph_page {
        pages.checkin_graph.clone_from(p);
    }

    let session = SessionClient::new(base_url, pages, transport)?;

    let network = global
        .network
        .clone()
        .or_else(|| profile.network.clone())
        .ok_or_else(|| CliError::Validation {
            field: "network".into(),
            reason: "no network selected; pass --network or set dashboard.network".into(),
        })?;

    let mut collector = DashboardCollector::new(session, network, policy);
    collector.login(&username, &password).await?;
    collector.run().await?;

    Ok(collector.into_survey())
}
