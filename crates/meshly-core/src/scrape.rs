// Legacy dashboard collection driver.
//
// The session surface has no network list endpoint: a run targets one
// named network. Nodes come from the status table, uptime comes from the
// per-node checkin graph, and clients come from the users table.

use secrecy::SecretString;
use tracing::{info, warn};

use meshly_api::{SessionClient, html};

use crate::checkin;
use crate::error::CoreError;
use crate::rows;
use crate::survey::{AggregationPolicy, Survey};

/// Element ids the dashboard uses for its data tables.
const DEFAULT_STATUS_TABLE_ID: &str = "node-table";
const DEFAULT_USERS_TABLE_ID: &str = "user-table";

/// Collects a survey of one network from the legacy HTML dashboard.
pub struct DashboardCollector {
    session: SessionClient,
    survey: Survey,
    network: String,
    status_table_id: String,
    users_table_id: String,
}

impl DashboardCollector {
    pub fn new(session: SessionClient, network: impl Into<String>, policy: AggregationPolicy) -> Self {
        Self {
            session,
            survey: Survey::new(policy),
            network: network.into(),
            status_table_id: DEFAULT_STATUS_TABLE_ID.into(),
            users_table_id: DEFAULT_USERS_TABLE_ID.into(),
        }
    }

    /// Override the table element ids (dashboard skins vary).
    pub fn with_table_ids(
        mut self,
        status_table_id: impl Into<String>,
        users_table_id: impl Into<String>,
    ) -> Self {
        self.status_table_id = status_table_id.into();
        self.users_table_id = users_table_id.into();
        self
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn into_survey(self) -> Survey {
        self.survey
    }

    /// Establish the dashboard session.
    pub async fn login(&self, account: &str, password: &SecretString) -> Result<(), CoreError> {
        Ok(self.session.login(account, password).await?)
    }

    /// Run both collection passes in order: nodes, then users.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        self.collect_nodes().await?;
        self.collect_users().await
    }

    /// Distill the status page into nodes, then derive each node's uptime
    /// breakdown from its checkin graph.
    pub async fn collect_nodes(&mut self) -> Result<(), CoreError> {
        let page = self.session.status_page(&self.network).await?;
        let rows = html::table_rows(&page, &self.status_table_id);
        info!("distilled {} node rows for {}", rows.len(), self.network);

        for row in &rows {
            let node = rows::node_from_status_row(&self.network, row)?;
            self.survey.upsert_node(node);
        }

        let targets: Vec<_> = self
            .survey
            .nodes()
            .filter_map(|n| n.mac.clone().map(|mac| (n.key.clone(), mac)))
            .collect();

        for (key, mac) in targets {
            let image = self.session.checkin_graph(mac.as_str()).await?;
            match checkin::analyze(&image) {
                Ok(breakdown) => {
                    self.survey.set_node_timeline(&key, breakdown);
                }
                // A single unreadable graph degrades that node's uptime
                // metrics, not the whole run.
                Err(e) => warn!(node = %key, "checkin graph unreadable: {e}"),
            }
        }
        Ok(())
    }

    /// Distill the users page and merge each row into the survey.
    pub async fn collect_users(&mut self) -> Result<(), CoreError> {
        let page = self.session.users_page(&self.network).await?;
        let rows = html::table_rows(&page, &self.users_table_id);
        info!("distilled {} user rows for {}", rows.len(), self.network);

        for row in &rows {
            let client = rows::client_from_usage_row(&self.network, row)?;
            self.survey.record_client(client);
        }
        Ok(())
    }
}
