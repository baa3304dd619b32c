//! Turso/libSQL implementation of the touchpoint store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database};
use tracing::{debug, instrument};

use tally_core::store::{TouchpointIngest, TouchpointStore};
use tally_core::types::{
    AdImpression, Channel, Conversion, ConversionId, CreativePerformance, CustomerId,
    IntentClassification, SearchQuery, VideoInteraction,
};

use crate::error::{Error, Result};

/// SQL schema, one statement per entry.
const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS search_queries (
    query_id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    session_id TEXT,
    query_text TEXT NOT NULL,
    query_type TEXT,
    funnel_stage TEXT,
    intent TEXT,
    timestamp TEXT NOT NULL,
    sequence_position INTEGER
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS ad_impressions (
    impression_id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    creative_id TEXT NOT NULL,
    campaign_id TEXT,
    placement_id TEXT,
    ad_format TEXT NOT NULL,
    viewability_score REAL NOT NULL,
    view_duration_seconds INTEGER,
    timestamp TEXT NOT NULL,
    frequency_cap_count INTEGER NOT NULL,
    cost REAL NOT NULL,
    clicked INTEGER NOT NULL DEFAULT 0
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS video_interactions (
    interaction_id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    video_id TEXT NOT NULL,
    campaign_id TEXT,
    video_duration_seconds INTEGER NOT NULL,
    completion_rate REAL NOT NULL,
    quartile_completions TEXT NOT NULL,
    engagement_points INTEGER NOT NULL,
    drop_off_seconds INTEGER,
    interaction_type TEXT NOT NULL,
    timestamp TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS creative_performance (
    creative_id TEXT PRIMARY KEY,
    creative_name TEXT NOT NULL,
    creative_type TEXT NOT NULL,
    campaign_id TEXT,
    total_impressions INTEGER NOT NULL,
    unique_viewers INTEGER NOT NULL,
    avg_viewability REAL NOT NULL,
    click_through_rate REAL NOT NULL,
    conversion_rate REAL NOT NULL,
    brand_lift_score REAL NOT NULL,
    last_updated TEXT
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS conversions (
    conversion_id TEXT PRIMARY KEY,
    customer_id TEXT NOT NULL,
    conversion_type TEXT,
    value REAL NOT NULL,
    timestamp TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS touchpoint_attribution (
    channel TEXT NOT NULL,
    touchpoint_id TEXT NOT NULL,
    weight REAL NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (channel, touchpoint_id)
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_queries_customer_time ON search_queries(customer_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_impressions_customer_time ON ad_impressions(customer_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_impressions_creative ON ad_impressions(creative_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_impressions_campaign ON ad_impressions(campaign_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_queries_session ON search_queries(session_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_videos_customer_time ON video_interactions(customer_id, timestamp)",
];

const QUERY_COLUMNS: &str = "query_id, customer_id, session_id, query_text, query_type, funnel_stage, intent, timestamp, sequence_position";

const IMPRESSION_COLUMNS: &str = "impression_id, customer_id, creative_id, campaign_id, placement_id, ad_format, viewability_score, view_duration_seconds, timestamp, frequency_cap_count, cost, clicked";

const VIDEO_COLUMNS: &str = "interaction_id, customer_id, video_id, campaign_id, video_duration_seconds, completion_rate, quartile_completions, engagement_points, drop_off_seconds, interaction_type, timestamp";

const CREATIVE_COLUMNS: &str = "creative_id, creative_name, creative_type, campaign_id, total_impressions, unique_viewers, avg_viewability, click_through_rate, conversion_rate, brand_lift_score, last_updated";

/// Turso-backed touchpoint store.
///
/// Touchpoint lists come back ordered by timestamp, then insertion order.
#[derive(Clone)]
pub struct TursoTouchpointStore {
    _db: Arc<Database>,
    // In-memory databases live per connection, so one connection is shared.
    conn: Connection,
}

impl TursoTouchpointStore {
    /// Open (or create) a local embedded database file.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    /// Connect to a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::from_database(db).await
    }

    /// Create an in-memory database (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Get a database connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Ensure the database schema exists.
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.conn().execute(statement, ()).await?;
        }
        Ok(())
    }

    fn parse_query(row: &libsql::Row) -> Result<SearchQuery> {
        let intent_json: Option<String> = row.get(6)?;
        let timestamp_str: String = row.get(7)?;
        let sequence_position: Option<i64> = row.get(8)?;

        let intent: Option<IntentClassification> = intent_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(SearchQuery {
            query_id: row.get(0)?,
            customer_id: CustomerId(row.get(1)?),
            session_id: row.get(2)?,
            query_text: row.get(3)?,
            query_type: row.get(4)?,
            funnel_stage: row.get(5)?,
            intent,
            timestamp: parse_datetime(&timestamp_str)?,
            sequence_position: sequence_position.map(to_u32).transpose()?,
        })
    }

    fn parse_impression(row: &libsql::Row) -> Result<AdImpression> {
        let view_duration: Option<i64> = row.get(7)?;
        let timestamp_str: String = row.get(8)?;
        let frequency: i64 = row.get(9)?;
        let clicked: i64 = row.get(11)?;

        Ok(AdImpression {
            impression_id: row.get(0)?,
            customer_id: CustomerId(row.get(1)?),
            creative_id: row.get(2)?,
            campaign_id: row.get(3)?,
            placement_id: row.get(4)?,
            ad_format: row.get(5)?,
            viewability_score: row.get(6)?,
            view_duration_seconds: view_duration.map(to_u32).transpose()?,
            timestamp: parse_datetime(&timestamp_str)?,
            frequency_cap_count: to_u32(frequency)?,
            cost: row.get(10)?,
            clicked: clicked != 0,
        })
    }

    fn parse_video(row: &libsql::Row) -> Result<VideoInteraction> {
        let duration: i64 = row.get(4)?;
        let quartiles_json: String = row.get(6)?;
        let engagement_points: i64 = row.get(7)?;
        let drop_off: Option<i64> = row.get(8)?;
        let timestamp_str: String = row.get(10)?;

        Ok(VideoInteraction {
            interaction_id: row.get(0)?,
            customer_id: CustomerId(row.get(1)?),
            video_id: row.get(2)?,
            campaign_id: row.get(3)?,
            video_duration_seconds: to_u32(duration)?,
            completion_rate: row.get(5)?,
            quartile_completions: serde_json::from_str(&quartiles_json)?,
            engagement_points: to_u32(engagement_points)?,
            drop_off_seconds: drop_off.map(to_u32).transpose()?,
            interaction_type: row.get(9)?,
            timestamp: parse_datetime(&timestamp_str)?,
        })
    }

    fn parse_creative(row: &libsql::Row) -> Result<CreativePerformance> {
        let total_impressions: i64 = row.get(4)?;
        let unique_viewers: i64 = row.get(5)?;
        let last_updated: Option<String> = row.get(10)?;

        Ok(CreativePerformance {
            creative_id: row.get(0)?,
            creative_name: row.get(1)?,
            creative_type: row.get(2)?,
            campaign_id: row.get(3)?,
            total_impressions: to_u64(total_impressions)?,
            unique_viewers: to_u64(unique_viewers)?,
            avg_viewability: row.get(6)?,
            click_through_rate: row.get(7)?,
            conversion_rate: row.get(8)?,
            brand_lift_score: row.get(9)?,
            last_updated: last_updated.as_deref().map(parse_datetime).transpose()?,
        })
    }

    fn parse_conversion(row: &libsql::Row) -> Result<Conversion> {
        let timestamp_str: String = row.get(4)?;
        Ok(Conversion {
            conversion_id: ConversionId(row.get(0)?),
            customer_id: CustomerId(row.get(1)?),
            conversion_type: row.get(2)?,
            value: row.get(3)?,
            timestamp: parse_datetime(&timestamp_str)?,
        })
    }

    // === Reads ===

    #[instrument(skip(self), level = "debug")]
    async fn load_queries(&self, column: &'static str, value: &str) -> Result<Vec<SearchQuery>> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {QUERY_COLUMNS} FROM search_queries WHERE {column} = ? ORDER BY timestamp ASC, rowid ASC"
                ),
                [value],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::parse_query(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_impressions(&self, column: &'static str, value: &str) -> Result<Vec<AdImpression>> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {IMPRESSION_COLUMNS} FROM ad_impressions WHERE {column} = ? ORDER BY timestamp ASC, rowid ASC"
                ),
                [value],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::parse_impression(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_videos(&self, customer_id: &str) -> Result<Vec<VideoInteraction>> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {VIDEO_COLUMNS} FROM video_interactions WHERE customer_id = ? ORDER BY timestamp ASC, rowid ASC"
                ),
                [customer_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::parse_video(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_conversion(&self, conversion_id: &str) -> Result<Option<Conversion>> {
        let mut rows = self
            .conn()
            .query(
                "SELECT conversion_id, customer_id, conversion_type, value, timestamp FROM conversions WHERE conversion_id = ?",
                [conversion_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_conversion(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_creative(&self, creative_id: &str) -> Result<Option<CreativePerformance>> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {CREATIVE_COLUMNS} FROM creative_performance WHERE creative_id = ?"
                ),
                [creative_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_creative(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn load_weight(&self, channel: Channel, touchpoint_id: &str) -> Result<Option<f64>> {
        let mut rows = self
            .conn()
            .query(
                "SELECT weight FROM touchpoint_attribution WHERE channel = ? AND touchpoint_id = ?",
                [channel.as_str(), touchpoint_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    // === Writes ===

    #[instrument(skip(self), level = "debug")]
    async fn upsert_weight(&self, channel: Channel, touchpoint_id: &str, weight: f64) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO touchpoint_attribution (channel, touchpoint_id, weight, updated_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(channel, touchpoint_id) DO UPDATE SET weight = excluded.weight, updated_at = excluded.updated_at",
                libsql::params![
                    channel.as_str(),
                    touchpoint_id,
                    weight,
                    format_datetime(Utc::now())
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, classification), level = "debug")]
    async fn update_intent(
        &self,
        query_id: &str,
        classification: &IntentClassification,
    ) -> Result<()> {
        let intent_json = serde_json::to_string(classification)?;
        let updated = self
            .conn()
            .execute(
                "UPDATE search_queries SET intent = ? WHERE query_id = ?",
                libsql::params![intent_json, query_id],
            )
            .await?;
        if updated == 0 {
            return Err(Error::NotFound {
                kind: "query",
                id: query_id.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, query), fields(query_id = %query.query_id), level = "debug")]
    async fn store_query(&self, query: &SearchQuery) -> Result<()> {
        let intent_json = query
            .intent
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let inserted = self
            .conn()
            .execute(
                &format!(
                    "INSERT INTO search_queries ({QUERY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(query_id) DO NOTHING"
                ),
                libsql::params![
                    query.query_id.clone(),
                    query.customer_id.as_str(),
                    query.session_id.clone(),
                    query.query_text.clone(),
                    query.query_type.clone(),
                    query.funnel_stage.clone(),
                    intent_json,
                    format_datetime(query.timestamp),
                    query.sequence_position.map(i64::from)
                ],
            )
            .await?;
        ensure_inserted(inserted, "query", &query.query_id)
    }

    #[instrument(skip(self, impression), fields(impression_id = %impression.impression_id), level = "debug")]
    async fn store_impression(&self, impression: &AdImpression) -> Result<()> {
        let inserted = self
            .conn()
            .execute(
                &format!(
                    "INSERT INTO ad_impressions ({IMPRESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(impression_id) DO NOTHING"
                ),
                libsql::params![
                    impression.impression_id.clone(),
                    impression.customer_id.as_str(),
                    impression.creative_id.clone(),
                    impression.campaign_id.clone(),
                    impression.placement_id.clone(),
                    impression.ad_format.clone(),
                    impression.viewability_score,
                    impression.view_duration_seconds.map(i64::from),
                    format_datetime(impression.timestamp),
                    i64::from(impression.frequency_cap_count),
                    impression.cost,
                    i64::from(impression.clicked)
                ],
            )
            .await?;
        ensure_inserted(inserted, "impression", &impression.impression_id)
    }

    #[instrument(skip(self, video), fields(interaction_id = %video.interaction_id), level = "debug")]
    async fn store_video(&self, video: &VideoInteraction) -> Result<()> {
        let quartiles_json = serde_json::to_string(&video.quartile_completions)?;
        let inserted = self
            .conn()
            .execute(
                &format!(
                    "INSERT INTO video_interactions ({VIDEO_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(interaction_id) DO NOTHING"
                ),
                libsql::params![
                    video.interaction_id.clone(),
                    video.customer_id.as_str(),
                    video.video_id.clone(),
                    video.campaign_id.clone(),
                    i64::from(video.video_duration_seconds),
                    video.completion_rate,
                    quartiles_json,
                    i64::from(video.engagement_points),
                    video.drop_off_seconds.map(i64::from),
                    video.interaction_type.clone(),
                    format_datetime(video.timestamp)
                ],
            )
            .await?;
        ensure_inserted(inserted, "video interaction", &video.interaction_id)
    }

    #[instrument(skip(self, conversion), fields(conversion_id = %conversion.conversion_id), level = "debug")]
    async fn store_conversion(&self, conversion: &Conversion) -> Result<()> {
        let inserted = self
            .conn()
            .execute(
                "INSERT INTO conversions (conversion_id, customer_id, conversion_type, value, timestamp) VALUES (?, ?, ?, ?, ?) ON CONFLICT(conversion_id) DO NOTHING",
                libsql::params![
                    conversion.conversion_id.as_str(),
                    conversion.customer_id.as_str(),
                    conversion.conversion_type.clone(),
                    conversion.value,
                    format_datetime(conversion.timestamp)
                ],
            )
            .await?;
        ensure_inserted(inserted, "conversion", conversion.conversion_id.as_str())
    }

    #[instrument(skip(self, creative), fields(creative_id = %creative.creative_id), level = "debug")]
    async fn store_creative(&self, creative: &CreativePerformance) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO creative_performance ({CREATIVE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(creative_id) DO UPDATE SET
                        creative_name = excluded.creative_name,
                        creative_type = excluded.creative_type,
                        campaign_id = excluded.campaign_id,
                        total_impressions = excluded.total_impressions,
                        unique_viewers = excluded.unique_viewers,
                        avg_viewability = excluded.avg_viewability,
                        click_through_rate = excluded.click_through_rate,
                        conversion_rate = excluded.conversion_rate,
                        brand_lift_score = excluded.brand_lift_score,
                        last_updated = excluded.last_updated"
                ),
                libsql::params![
                    creative.creative_id.clone(),
                    creative.creative_name.clone(),
                    creative.creative_type.clone(),
                    creative.campaign_id.clone(),
                    to_i64(creative.total_impressions)?,
                    to_i64(creative.unique_viewers)?,
                    creative.avg_viewability,
                    creative.click_through_rate,
                    creative.conversion_rate,
                    creative.brand_lift_score,
                    creative.last_updated.map(format_datetime)
                ],
            )
            .await?;
        debug!("creative performance upserted");
        Ok(())
    }
}

#[async_trait]
impl TouchpointStore for TursoTouchpointStore {
    async fn search_history(&self, customer_id: &CustomerId) -> tally_core::Result<Vec<SearchQuery>> {
        Ok(self.load_queries("customer_id", customer_id.as_str()).await?)
    }

    async fn display_history(
        &self,
        customer_id: &CustomerId,
    ) -> tally_core::Result<Vec<AdImpression>> {
        Ok(self
            .load_impressions("customer_id", customer_id.as_str())
            .await?)
    }

    async fn video_interactions(
        &self,
        customer_id: &CustomerId,
    ) -> tally_core::Result<Vec<VideoInteraction>> {
        Ok(self.load_videos(customer_id.as_str()).await?)
    }

    async fn conversion(&self, id: &ConversionId) -> tally_core::Result<Option<Conversion>> {
        Ok(self.load_conversion(id.as_str()).await?)
    }

    async fn creative_performance(
        &self,
        creative_id: &str,
    ) -> tally_core::Result<Option<CreativePerformance>> {
        Ok(self.load_creative(creative_id).await?)
    }

    async fn creative_impressions(&self, creative_id: &str) -> tally_core::Result<Vec<AdImpression>> {
        Ok(self.load_impressions("creative_id", creative_id).await?)
    }

    async fn campaign_impressions(&self, campaign_id: &str) -> tally_core::Result<Vec<AdImpression>> {
        Ok(self.load_impressions("campaign_id", campaign_id).await?)
    }

    async fn session_queries(&self, session_id: &str) -> tally_core::Result<Vec<SearchQuery>> {
        Ok(self.load_queries("session_id", session_id).await?)
    }

    async fn attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
    ) -> tally_core::Result<Option<f64>> {
        Ok(self.load_weight(channel, touchpoint_id).await?)
    }

    async fn record_attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
        weight: f64,
    ) -> tally_core::Result<()> {
        Ok(self.upsert_weight(channel, touchpoint_id, weight).await?)
    }

    async fn record_intent(
        &self,
        query_id: &str,
        classification: &IntentClassification,
    ) -> tally_core::Result<()> {
        Ok(self.update_intent(query_id, classification).await?)
    }
}

#[async_trait]
impl TouchpointIngest for TursoTouchpointStore {
    async fn insert_query(&self, query: &SearchQuery) -> tally_core::Result<()> {
        Ok(self.store_query(query).await?)
    }

    async fn insert_impression(&self, impression: &AdImpression) -> tally_core::Result<()> {
        Ok(self.store_impression(impression).await?)
    }

    async fn insert_video_interaction(
        &self,
        interaction: &VideoInteraction,
    ) -> tally_core::Result<()> {
        Ok(self.store_video(interaction).await?)
    }

    async fn insert_conversion(&self, conversion: &Conversion) -> tally_core::Result<()> {
        Ok(self.store_conversion(conversion).await?)
    }

    async fn upsert_creative(&self, creative: &CreativePerformance) -> tally_core::Result<()> {
        Ok(self.store_creative(creative).await?)
    }
}

fn ensure_inserted(rows: u64, kind: &'static str, id: &str) -> Result<()> {
    if rows == 0 {
        return Err(Error::AlreadyExists {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime from storage.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidData(format!("invalid datetime: {}", s)))
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidData(format!("out of range: {}", value)))
}

fn to_u64(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidData(format!("out of range: {}", value)))
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::InvalidData(format!("out of range: {}", value)))
}
