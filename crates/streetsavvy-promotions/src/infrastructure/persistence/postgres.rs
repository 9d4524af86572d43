//! Postgres-backed store.
//!
//! # Data model
//! - `users`, `vendors`, `segments`, `campaigns` are reference tables.
//! - `user_location_events` and `campaign_user_engagements` are append-only.
//!
//! # Concurrency model
//! The store is shared across request handlers; `sqlx::PgPool` manages
//! checkout/checkin per call, so no extra locking happens here. Engagement
//! dedup runs in a transaction holding an advisory lock keyed on
//! (user, campaign, action), which serializes concurrent submissions for the
//! same key without a unique constraint on the history table.
//!
//! # Partial results
//! Campaign rows that fail to decode are logged and skipped. A failure of
//! the fetch itself fails the call.
//!
//! # Security notes
//! The connection password is never logged.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::{
    Campaign, CampaignRecord, Engagement, LocationEvent, PreferenceUpdate, Segment, User, Vendor,
};
use crate::domain::services::UsageCount;
use crate::domain::value_objects::{EntityId, GeoPoint};
use crate::ports::outbound::{
    CampaignRepository, EngagementRepository, LocationRepository, StoreError, StoreHealth,
    StoreResult, UserRepository,
};

/// Connection and pool settings
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub sslmode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            database: "streetsavvy".into(),
            sslmode: "disable".into(),
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(5 * 60),
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open the pool, verify connectivity and optionally run migrations.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let ssl_mode = PgSslMode::from_str(&config.sslmode)
            .map_err(|e| StoreError::Connection(format!("invalid sslmode {:?}: {e}", config.sslmode)))?;
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode);

        info!(
            host = %config.host,
            port = config.port,
            user = %config.user,
            database = %config.database,
            sslmode = %config.sslmode,
            "connecting to postgres"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(store_err)?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::Query(format!("migration failed: {e}")))?;
        }

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "postgres pool ready"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool (schema assumed present)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => StoreError::Connection(e.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: String,
    msisdn: Option<String>,
    imei: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    loyalty_tier: Option<String>,
    most_frequent_vendor: Option<String>,
    most_frequent_vendor_type: Option<String>,
    notif_sms: bool,
    notif_whatsapp: bool,
    notif_inapp: bool,
    privacy: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: EntityId::from_string(row.user_id),
            msisdn: row.msisdn,
            imei: row.imei,
            created_at: row.created_at,
            updated_at: row.updated_at,
            loyalty_tier: row.loyalty_tier,
            most_frequent_vendor: row.most_frequent_vendor,
            most_frequent_vendor_type: row.most_frequent_vendor_type,
            notif_sms: row.notif_sms,
            notif_whatsapp: row.notif_whatsapp,
            notif_inapp: row.notif_inapp,
            privacy: row.privacy,
        }
    }
}

#[derive(FromRow)]
struct LocationRow {
    user_id: String,
    lat: f64,
    long: f64,
    event_time: DateTime<Utc>,
}

/// One row of the campaign/vendor/segment join
#[derive(FromRow)]
struct CampaignRow {
    campaign_id: String,
    vendor_id: String,
    title: String,
    code: String,
    description: String,
    geofence_radius_km: f64,
    enabled: bool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    run_time: NaiveTime,
    segment_id: String,
    address: String,
    vendor_type: String,
    vendor_lat: f64,
    vendor_lng: f64,
    segment_name: String,
}

impl From<CampaignRow> for CampaignRecord {
    fn from(row: CampaignRow) -> Self {
        let vendor = Vendor::new(
            EntityId::from_string(row.vendor_id.clone()),
            row.address,
            row.vendor_type,
            GeoPoint::new_unchecked(row.vendor_lat, row.vendor_lng),
        );
        let segment = Segment::new(EntityId::from_string(row.segment_id.clone()), row.segment_name);
        let campaign = Campaign {
            campaign_id: EntityId::from_string(row.campaign_id),
            vendor_id: EntityId::from_string(row.vendor_id),
            title: row.title,
            code: row.code,
            description: row.description,
            geofence_radius_km: row.geofence_radius_km,
            enabled: row.enabled,
            start_date: row.start_date,
            end_date: row.end_date,
            run_time: row.run_time,
            segment_id: EntityId::from_string(row.segment_id),
        };
        CampaignRecord::new(campaign, vendor, &segment)
    }
}

#[derive(FromRow)]
struct UsageRow {
    key: Option<String>,
    count: i64,
}

fn into_counts(rows: Vec<UsageRow>) -> Vec<UsageCount> {
    rows.into_iter()
        .filter_map(|r| {
            let key = r.key?;
            Some(UsageCount::new(key, u64::try_from(r.count).unwrap_or(0)))
        })
        .collect()
}

#[async_trait]
impl StoreHealth for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn find_user(&self, id: &EntityId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, msisdn, imei, created_at, updated_at, loyalty_tier, \
                    most_frequent_vendor, most_frequent_vendor_type, \
                    notif_sms, notif_whatsapp, notif_inapp, privacy \
             FROM users WHERE user_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(User::from))
    }

    async fn update_preferences(
        &self,
        id: &EntityId,
        update: &PreferenceUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let vendor = update.vendor.as_deref().filter(|v| !v.is_empty());
        let vendor_type = update.vendor_type.as_deref().filter(|v| !v.is_empty());
        let result = sqlx::query(
            "UPDATE users SET \
                most_frequent_vendor = COALESCE($2, most_frequent_vendor), \
                most_frequent_vendor_type = COALESCE($3, most_frequent_vendor_type), \
                updated_at = $4 \
             WHERE user_id = $1",
        )
        .bind(id.as_str())
        .bind(vendor)
        .bind(vendor_type)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LocationRepository for PostgresStore {
    async fn latest_location(&self, user_id: &EntityId) -> StoreResult<Option<LocationEvent>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT user_id, lat, long, event_time FROM user_location_events \
             WHERE user_id = $1 ORDER BY event_time DESC, event_id DESC LIMIT 1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(|r| {
            LocationEvent::new(
                EntityId::from_string(r.user_id),
                GeoPoint::new_unchecked(r.lat, r.long),
                r.event_time,
            )
        }))
    }

    async fn append_location(&self, event: &LocationEvent) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_location_events (user_id, lat, long, event_time) VALUES ($1, $2, $3, $4)",
        )
        .bind(event.user_id.as_str())
        .bind(event.point.lat())
        .bind(event.point.lng())
        .bind(event.event_time)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl CampaignRepository for PostgresStore {
    async fn load_campaigns(&self) -> StoreResult<Vec<CampaignRecord>> {
        let rows = sqlx::query(
            "SELECT c.campaign_id, c.vendor_id, c.title, c.code, c.description, \
                    c.geofence_radius_km, c.enabled, c.start_date, c.end_date, c.run_time, \
                    c.segment_id, v.address, v.vendor_type, \
                    v.lat AS vendor_lat, v.long AS vendor_lng, s.segment_name \
             FROM campaigns c \
             JOIN vendors v ON c.vendor_id = v.vendor_id \
             JOIN segments s ON c.segment_id = s.segment_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match CampaignRow::from_row(row) {
                Ok(decoded) => records.push(CampaignRecord::from(decoded)),
                Err(e) => warn!(error = %e, "skipping campaign row that failed to decode"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl EngagementRepository for PostgresStore {
    async fn append_engagement_unless_recent(
        &self,
        engagement: &Engagement,
        since: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let lock_key = format!(
            "{}:{}:{}",
            engagement.user_id, engagement.campaign_id, engagement.action
        );
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let recent: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM campaign_user_engagements \
                WHERE user_id = $1 AND campaign_id = $2 AND action = $3 AND engaged_at >= $4)",
        )
        .bind(engagement.user_id.as_str())
        .bind(engagement.campaign_id.as_str())
        .bind(engagement.action.as_str())
        .bind(since)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        if recent {
            tx.rollback().await.map_err(store_err)?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO campaign_user_engagements \
                (engagement_id, user_id, campaign_id, action, loc_lat, loc_long, engaged_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind::<Uuid>(engagement.engagement_id)
        .bind(engagement.user_id.as_str())
        .bind(engagement.campaign_id.as_str())
        .bind(engagement.action.as_str())
        .bind(engagement.location.lat())
        .bind(engagement.location.lng())
        .bind(engagement.engaged_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(true)
    }

    async fn used_counts_by_vendor(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            "SELECT c.vendor_id AS key, COUNT(*) AS count \
             FROM campaign_user_engagements e \
             JOIN campaigns c ON c.campaign_id = e.campaign_id \
             WHERE e.user_id = $1 AND e.action = 'used' \
             GROUP BY c.vendor_id \
             ORDER BY count DESC, key ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(into_counts(rows))
    }

    async fn used_counts_by_vendor_type(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            "SELECT v.vendor_type AS key, COUNT(*) AS count \
             FROM campaign_user_engagements e \
             JOIN campaigns c ON c.campaign_id = e.campaign_id \
             JOIN vendors v ON v.vendor_id = c.vendor_id \
             WHERE e.user_id = $1 AND e.action = 'used' \
             GROUP BY v.vendor_type \
             ORDER BY count DESC, key ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(into_counts(rows))
    }
}
