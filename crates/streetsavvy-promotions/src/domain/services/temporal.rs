//! Temporal validity of a campaign.
//!
//! A campaign is live when it is enabled and `now` falls inside the
//! inclusive `[start_date, end_date]` calendar range. On the start date
//! itself it only goes live once the time of day reaches `run_time`; on
//! later days it runs all day. The end date has no time cutoff.
//! Calendar dates and times of day are evaluated in UTC.

use chrono::{DateTime, Utc};

use crate::domain::aggregates::Campaign;

pub fn is_live(campaign: &Campaign, now: DateTime<Utc>) -> bool {
    if !campaign.enabled {
        return false;
    }
    let today = now.date_naive();
    if today < campaign.start_date || today > campaign.end_date {
        return false;
    }
    if today == campaign.start_date {
        return now.time() >= campaign.run_time;
    }
    true
}
