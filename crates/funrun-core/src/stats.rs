// ── Statistics read path ──

use std::sync::Arc;

use funrun_api::{BackendClient, DailyStats, TransportConfig};
use serde::Serialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::{RecorderConfig, SchoolPolicy};
use crate::error::CoreError;
use crate::model::StaffIdentity;

/// Aggregates for one receiver on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub receiver_email: String,
    /// The date that was asked for (`M/D/YYYY`).
    pub date: String,
    #[serde(flatten)]
    pub stats: DailyStats,
}

impl StatsReport {
    pub fn previous_payments(&self) -> u64 {
        self.stats.previous_payments()
    }

    pub fn previous_amount(&self) -> f64 {
        self.stats.previous_amount()
    }
}

/// Reads per-receiver payment totals from the backend.
pub struct StatsReader {
    client: BackendClient,
    school: SchoolPolicy,
    clock: Arc<dyn Clock>,
}

impl StatsReader {
    pub fn new(client: BackendClient, school: SchoolPolicy) -> Self {
        Self {
            client,
            school,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn connect(config: &RecorderConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.request_timeout);
        let client = BackendClient::new(
            config.submit_url.clone(),
            config.stats_url.clone(),
            &transport,
        )?;
        Ok(Self::new(client, config.school.clone()))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Totals recorded by `staff`. `date` defaults to today in school time.
    pub async fn daily(
        &self,
        staff: &StaffIdentity,
        date: Option<&str>,
    ) -> Result<StatsReport, CoreError> {
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => date.to_owned(),
            None => self.school.stats_date(self.clock.now()),
        };

        debug!(email = %staff.email, %date, "fetching payment statistics");
        let stats = self.client.daily_stats(&staff.email, Some(&date)).await?;

        Ok(StatsReport {
            receiver_email: staff.email.clone(),
            date,
            stats,
        })
    }
}

impl std::fmt::Debug for StatsReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsReader")
            .field("client", &self.client)
            .field("school", &self.school)
            .finish_non_exhaustive()
    }
}
