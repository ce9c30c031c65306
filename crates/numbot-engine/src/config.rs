//! Engine configuration.

use std::collections::HashMap;

use chrono::NaiveDate;
use chrono_tz::Tz;

use numbot_core::{
    UserId, DAILY_GRANT_CREDITS, DEFAULT_DAILY_FEATURE_CAP, DEFAULT_LOOKUP_COST,
    DEFAULT_STARTING_CREDITS, SPECIAL_BALANCE_CREDITS,
};

/// Feature tag of the rate-limited record-view feature.
pub const VIEWS_FEATURE: &str = "views";

/// Engine configuration.
///
/// Costs and caps are per feature tag; anything not listed costs
/// `default_cost` and is uncapped.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The singleton administrator's user id.
    pub admin_user_id: UserId,

    /// Credits a freshly created account starts with.
    pub starting_credits: i64,

    /// Credits granted once per calendar day to normal accounts.
    pub daily_grant_credits: i64,

    /// Balance assigned on promotion to special status.
    pub special_credits: i64,

    /// Cost of a paid feature with no explicit override.
    pub default_cost: i64,

    /// Per-feature cost overrides.
    pub feature_costs: HashMap<String, i64>,

    /// Daily invocation caps, per capped feature. Caps apply to every role.
    pub feature_caps: HashMap<String, u32>,

    /// Time zone whose calendar days drive the grant and the caps.
    pub time_zone: Tz,
}

impl EngineConfig {
    /// Create a configuration with production defaults.
    #[must_use]
    pub fn new(admin_user_id: UserId) -> Self {
        let mut feature_caps = HashMap::new();
        feature_caps.insert(VIEWS_FEATURE.to_string(), DEFAULT_DAILY_FEATURE_CAP);

        Self {
            admin_user_id,
            starting_credits: DEFAULT_STARTING_CREDITS,
            daily_grant_credits: DAILY_GRANT_CREDITS,
            special_credits: SPECIAL_BALANCE_CREDITS,
            default_cost: DEFAULT_LOOKUP_COST,
            feature_costs: HashMap::new(),
            feature_caps,
            time_zone: chrono_tz::Asia::Kolkata,
        }
    }

    /// Override the service time zone.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Set or replace a feature's daily cap.
    #[must_use]
    pub fn with_feature_cap(mut self, feature: impl Into<String>, cap: u32) -> Self {
        self.feature_caps.insert(feature.into(), cap);
        self
    }

    /// Set or replace a feature's cost.
    #[must_use]
    pub fn with_feature_cost(mut self, feature: impl Into<String>, cost: i64) -> Self {
        self.feature_costs.insert(feature.into(), cost);
        self
    }

    /// The cost of one invocation of `feature` for a normal caller.
    #[must_use]
    pub fn feature_cost(&self, feature: &str) -> i64 {
        self.feature_costs
            .get(feature)
            .copied()
            .unwrap_or(self.default_cost)
    }

    /// The daily cap for `feature`, if it is rate-limited.
    #[must_use]
    pub fn feature_cap(&self, feature: &str) -> Option<u32> {
        self.feature_caps.get(feature).copied()
    }

    /// Today's calendar date in the configured time zone.
    ///
    /// The single source of "today": the daily grant and every feature cap
    /// share this boundary, so they can never drift apart.
    #[must_use]
    pub fn service_day(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.time_zone).date_naive()
    }
}
