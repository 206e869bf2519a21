//! NHL stats API client
//!
//! Live feed, schedule lookup and the leading/trailing season records. No API
//! key required.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{PlayByPlayDocument, SnapshotFetcher};
use crate::config::EndpointsConfig;
use crate::domain::LeadRecord;
use crate::error::{BotError, Result};

// ── Schedule JSON ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleGame {
    game_pk: u64,
}

// ── Lead / trail report JSON ────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    data: Vec<LeadTrailRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadTrailRow {
    #[serde(default, rename = "winsAfterLead1p")]
    wins_after_lead_1p: u32,
    #[serde(default, rename = "lossAfterLead1p")]
    loss_after_lead_1p: u32,
    #[serde(default, rename = "otLossAfterLead1p")]
    ot_loss_after_lead_1p: u32,
    #[serde(default, rename = "winsAfterLead2p")]
    wins_after_lead_2p: u32,
    #[serde(default, rename = "lossAfterLead2p")]
    loss_after_lead_2p: u32,
    #[serde(default, rename = "otLossAfterLead2p")]
    ot_loss_after_lead_2p: u32,
}

impl LeadTrailRow {
    fn records(&self) -> [Option<LeadRecord>; 2] {
        [
            Some(LeadRecord {
                wins: self.wins_after_lead_1p,
                losses: self.loss_after_lead_1p,
                ot_losses: self.ot_loss_after_lead_1p,
            }),
            Some(LeadRecord {
                wins: self.wins_after_lead_2p,
                losses: self.loss_after_lead_2p,
                ot_losses: self.ot_loss_after_lead_2p,
            }),
        ]
    }
}

// ── Client ──────────────────────────────────────────────────────

/// Stats API client
pub struct NhlApiClient {
    http: reqwest::Client,
    stats_api: String,
    reports_api: String,
}

impl NhlApiClient {
    pub fn new(endpoints: &EndpointsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoints.http_timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            stats_api: endpoints.stats_api.trim_end_matches('/').to_string(),
            reports_api: endpoints.reports_api.trim_end_matches('/').to_string(),
        })
    }

    fn live_feed_url(&self, game_id: u64) -> String {
        format!("{}/api/v1/game/{}/feed/live", self.stats_api, game_id)
    }

    /// Game id the team plays on `date`, if any
    pub async fn find_game(&self, team_id: u64, date: NaiveDate) -> Result<Option<u64>> {
        let url = format!("{}/api/v1/schedule", self.stats_api);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("teamId", team_id.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .context("schedule request failed")?;

        if !resp.status().is_success() {
            return Err(BotError::Schedule(format!(
                "schedule lookup returned HTTP {}",
                resp.status()
            )));
        }

        let schedule: ScheduleResponse = resp
            .json()
            .await
            .context("schedule JSON parse failed")?;

        let game_id = schedule
            .dates
            .first()
            .and_then(|d| d.games.first())
            .map(|g| g.game_pk);
        debug!(team_id, %date, ?game_id, "schedule lookup");
        Ok(game_id)
    }

    /// Season record when leading after the 1st and 2nd period
    pub async fn lead_records(
        &self,
        team_id: u64,
        season: &str,
    ) -> Result<[Option<LeadRecord>; 2]> {
        let url = format!(
            "{}/team?isAggregate=false&reportType=basic&isGame=false&reportName=leadingtrailing\
             &cayenneExp=seasonId={}%20and%20teamId={}",
            self.reports_api, season, team_id
        );
        let report: ReportResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("lead/trail report request failed")?
            .json()
            .await
            .context("lead/trail report JSON parse failed")?;

        Ok(report
            .data
            .first()
            .map(LeadTrailRow::records)
            .unwrap_or([None, None]))
    }
}

/// "20232024" for any date in the 2023-24 season (seasons roll over in September)
pub fn season_id(date: NaiveDate) -> String {
    let start = if date.month() >= 9 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}{}", start, start + 1)
}

#[async_trait]
impl SnapshotFetcher for NhlApiClient {
    async fn fetch(&self, game_id: u64) -> Result<PlayByPlayDocument> {
        let resp = self
            .http
            .get(self.live_feed_url(game_id))
            .send()
            .await?;

        let status = resp.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(BotError::FeedUnavailable(format!(
                "live feed for {} returned HTTP {}",
                game_id, status
            )));
        }
        if !status.is_success() {
            return Err(BotError::Validation(format!(
                "live feed for {} returned HTTP {}",
                game_id, status
            )));
        }

        let body = resp.text().await?;
        let doc = PlayByPlayDocument::from_json(&body)?;
        debug!(game_id, plays = doc.plays.len(), state = %doc.game_state, "fetched live feed");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_id() {
        assert_eq!(
            season_id(NaiveDate::from_ymd_opt(2023, 10, 12).unwrap()),
            "20232024"
        );
        assert_eq!(
            season_id(NaiveDate::from_ymd_opt(2024, 4, 18).unwrap()),
            "20232024"
        );
    }

    #[test]
    fn test_parse_lead_trail_report() {
        let json = r#"{"data": [{
            "teamId": 1,
            "winsAfterLead1p": 14, "lossAfterLead1p": 3, "otLossAfterLead1p": 1,
            "winsAfterLead2p": 20, "lossAfterLead2p": 2, "otLossAfterLead2p": 0
        }]}"#;
        let report: ReportResponse = serde_json::from_str(json).unwrap();
        let [first, second] = report.data[0].records();
        assert_eq!(first.unwrap().to_string(), "14-3-1");
        assert_eq!(second.unwrap().wins, 20);
    }

    #[test]
    fn test_parse_schedule() {
        let json = r#"{"dates": [{"games": [{"gamePk": 2023020005}]}]}"#;
        let schedule: ScheduleResponse = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.dates[0].games[0].game_pk, 2023020005);

        let empty: ScheduleResponse = serde_json::from_str(r#"{"dates": []}"#).unwrap();
        assert!(empty.dates.is_empty());
    }

    #[test]
    fn test_live_feed_url() {
        let client = NhlApiClient::new(&EndpointsConfig {
            stats_api: "https://statsapi.example/".into(),
            ..EndpointsConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.live_feed_url(2023020001),
            "https://statsapi.example/api/v1/game/2023020001/feed/live"
        );
    }
}
