//! API Models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use streetsavvy_promotions::{Campaign, CampaignMatch, EngagementResult, LocationEvent, User};
use utoipa::ToSchema;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

// ============ Users ============

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub user_id: String,
    pub msisdn: Option<String>,
    pub loyalty_tier: Option<String>,
    pub most_frequent_vendor: Option<String>,
    pub most_frequent_vendor_type: Option<String>,
    pub notif_sms: bool,
    pub notif_whatsapp: bool,
    pub notif_inapp: bool,
    pub privacy: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            msisdn: user.msisdn,
            loyalty_tier: user.loyalty_tier,
            most_frequent_vendor: user.most_frequent_vendor,
            most_frequent_vendor_type: user.most_frequent_vendor_type,
            notif_sms: user.notif_sms,
            notif_whatsapp: user.notif_whatsapp,
            notif_inapp: user.notif_inapp,
            privacy: user.privacy,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Location ping
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationCreate {
    pub lat: f64,
    pub lng: f64,
}

/// Recorded location event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationView {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub event_time: DateTime<Utc>,
}

impl From<LocationEvent> for LocationView {
    fn from(event: LocationEvent) -> Self {
        Self {
            user_id: event.user_id.to_string(),
            lat: event.point.lat(),
            lng: event.point.lng(),
            event_time: event.event_time,
        }
    }
}

// ============ Campaigns ============

/// Campaign
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignView {
    pub campaign_id: String,
    pub vendor_id: String,
    pub title: String,
    pub code: String,
    pub description: String,
    pub geofence_radius_km: f64,
    pub enabled: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `HH:MM:SS`, UTC
    pub run_time: String,
    pub segment_id: String,
}

impl From<Campaign> for CampaignView {
    fn from(c: Campaign) -> Self {
        Self {
            campaign_id: c.campaign_id.to_string(),
            vendor_id: c.vendor_id.to_string(),
            title: c.title,
            code: c.code,
            description: c.description,
            geofence_radius_km: c.geofence_radius_km,
            enabled: c.enabled,
            start_date: c.start_date,
            end_date: c.end_date,
            run_time: c.run_time.format("%H:%M:%S").to_string(),
            segment_id: c.segment_id.to_string(),
        }
    }
}

/// Campaign the user qualifies for, with vendor details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignMatchView {
    pub campaign_id: String,
    pub vendor_id: String,
    pub title: String,
    pub code: String,
    pub description: String,
    pub geofence_radius_km: f64,
    pub vendor_address: String,
    pub vendor_type: String,
    pub vendor_lat: f64,
    pub vendor_lng: f64,
}

impl From<CampaignMatch> for CampaignMatchView {
    fn from(m: CampaignMatch) -> Self {
        Self {
            campaign_id: m.campaign_id.to_string(),
            vendor_id: m.vendor_id.to_string(),
            title: m.title,
            code: m.code,
            description: m.description,
            geofence_radius_km: m.geofence_radius_km,
            vendor_address: m.vendor_address,
            vendor_type: m.vendor_type,
            vendor_lat: m.vendor_lat,
            vendor_lng: m.vendor_lng,
        }
    }
}

// ============ Engagements ============

/// Engagement submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EngagementCreate {
    /// `clicked` or `used`
    pub action: String,
}

/// Engagement outcome
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EngagementView {
    pub user_id: String,
    pub campaign_id: String,
    pub action: String,
    /// True when the action fell inside the dedup window and was not stored
    pub duplicate: bool,
    pub message: String,
}

impl From<EngagementResult> for EngagementView {
    fn from(r: EngagementResult) -> Self {
        let message = if r.duplicate {
            "Duplicate engagement ignored".to_string()
        } else {
            format!("Engagement recorded: {}", r.action)
        };
        Self {
            user_id: r.user_id.to_string(),
            campaign_id: r.campaign_id.to_string(),
            action: r.action.to_string(),
            duplicate: r.duplicate,
            message,
        }
    }
}
