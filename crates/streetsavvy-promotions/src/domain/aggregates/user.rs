//! User Aggregate
//!
//! Reference data provisioned elsewhere. The engine only rewrites the two
//! preference fields derived from engagement history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: EntityId,
    pub msisdn: Option<String>,
    pub imei: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub loyalty_tier: Option<String>,
    pub most_frequent_vendor: Option<String>,
    pub most_frequent_vendor_type: Option<String>,
    pub notif_sms: bool,
    pub notif_whatsapp: bool,
    pub notif_inapp: bool,
    pub privacy: bool,
}

impl User {
    pub fn create(user_id: EntityId, loyalty_tier: Option<String>) -> Self {
        Self {
            user_id,
            msisdn: None,
            imei: None,
            created_at: Utc::now(),
            updated_at: None,
            loyalty_tier,
            most_frequent_vendor: None,
            most_frequent_vendor_type: None,
            notif_sms: false,
            notif_whatsapp: false,
            notif_inapp: true,
            privacy: false,
        }
    }

    pub fn with_preferences(
        mut self,
        vendor: Option<&str>,
        vendor_type: Option<&str>,
    ) -> Self {
        self.most_frequent_vendor = vendor.map(str::to_string);
        self.most_frequent_vendor_type = vendor_type.map(str::to_string);
        self
    }

    /// Apply derived preferences without clearing existing values.
    ///
    /// Returns true when a field actually changed.
    pub fn apply_preferences(&mut self, update: &PreferenceUpdate, at: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(vendor) = update.vendor.as_deref().filter(|v| !v.is_empty()) {
            if self.most_frequent_vendor.as_deref() != Some(vendor) {
                self.most_frequent_vendor = Some(vendor.to_string());
                changed = true;
            }
        }
        if let Some(vendor_type) = update.vendor_type.as_deref().filter(|v| !v.is_empty()) {
            if self.most_frequent_vendor_type.as_deref() != Some(vendor_type) {
                self.most_frequent_vendor_type = Some(vendor_type.to_string());
                changed = true;
            }
        }
        if changed {
            self.updated_at = Some(at);
        }
        changed
    }
}

/// Preference values computed from `used` engagement history.
/// `None` means "keep the stored value".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreferenceUpdate {
    pub vendor: Option<String>,
    pub vendor_type: Option<String>,
}

impl PreferenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.vendor.as_deref().map_or(true, str::is_empty)
            && self.vendor_type.as_deref().map_or(true, str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_preferences_sets_both() {
        let mut user = User::create(EntityId::from("u1"), Some("gold".into()));
        let update = PreferenceUpdate {
            vendor: Some("v1".into()),
            vendor_type: Some("cafe".into()),
        };
        assert!(user.apply_preferences(&update, Utc::now()));
        assert_eq!(user.most_frequent_vendor.as_deref(), Some("v1"));
        assert_eq!(user.most_frequent_vendor_type.as_deref(), Some("cafe"));
        assert!(user.updated_at.is_some());
    }

    #[test]
    fn test_apply_preferences_never_clears() {
        let mut user = User::create(EntityId::from("u1"), None).with_preferences(Some("v1"), Some("cafe"));
        let update = PreferenceUpdate {
            vendor: None,
            vendor_type: Some(String::new()),
        };
        assert!(!user.apply_preferences(&update, Utc::now()));
        assert_eq!(user.most_frequent_vendor.as_deref(), Some("v1"));
        assert_eq!(user.most_frequent_vendor_type.as_deref(), Some("cafe"));
        assert!(user.updated_at.is_none());
    }

    #[test]
    fn test_empty_update() {
        assert!(PreferenceUpdate::default().is_empty());
        assert!(PreferenceUpdate { vendor: Some(String::new()), vendor_type: None }.is_empty());
        assert!(!PreferenceUpdate { vendor: None, vendor_type: Some("bar".into()) }.is_empty());
    }
}
