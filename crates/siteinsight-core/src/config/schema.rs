//! GA4 metric and dimension allow-lists
//!
//! Names produced by the model are only forwarded to the Data API if they
//! appear here.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref VALID_METRICS: HashSet<&'static str> = [
        // Users
        "activeUsers",
        "newUsers",
        "totalUsers",
        // Sessions
        "sessions",
        "sessionsPerUser",
        "averageSessionDuration",
        "engagementRate",
        "bounceRate",
        // Pages and screens
        "screenPageViews",
        "screenPageViewsPerSession",
        // Events
        "eventCount",
        "eventsPerSession",
        "conversions",
        // Engagement
        "engagedSessions",
        "userEngagementDuration",
        // E-commerce
        "totalRevenue",
        "purchaseRevenue",
        "transactions",
        "addToCarts",
    ]
    .into_iter()
    .collect();

    static ref VALID_DIMENSIONS: HashSet<&'static str> = [
        // Time
        "date",
        "year",
        "month",
        "week",
        "day",
        "hour",
        "yearMonth",
        "yearWeek",
        // Geography
        "country",
        "city",
        "region",
        "continent",
        // Technology
        "browser",
        "deviceCategory",
        "operatingSystem",
        "platform",
        "mobileDeviceBranding",
        "mobileDeviceModel",
        // Pages and screens
        "pagePath",
        "pagePathPlusQueryString",
        "pageTitle",
        "landingPage",
        "hostName",
        "unifiedScreenName",
        // Traffic source
        "source",
        "medium",
        "campaignName",
        "sessionSource",
        "sessionMedium",
        "sessionCampaignName",
        "firstUserSource",
        "firstUserMedium",
        // Users
        "newVsReturning",
        "userAgeBracket",
        "userGender",
        "language",
        // Events
        "eventName",
    ]
    .into_iter()
    .collect();
}

pub fn is_valid_metric(name: &str) -> bool {
    VALID_METRICS.contains(name)
}

pub fn is_valid_dimension(name: &str) -> bool {
    VALID_DIMENSIONS.contains(name)
}

/// Sorted metric allow-list, as shown to the model
pub fn allowed_metrics() -> Vec<&'static str> {
    let mut names: Vec<_> = VALID_METRICS.iter().copied().collect();
    names.sort_unstable();
    names
}

/// Sorted dimension allow-list, as shown to the model
pub fn allowed_dimensions() -> Vec<&'static str> {
    let mut names: Vec<_> = VALID_DIMENSIONS.iter().copied().collect();
    names.sort_unstable();
    names
}

/// Split names into (accepted, rejected), preserving order and dropping duplicates
pub fn partition_valid<F>(names: &[String], is_valid: F) -> (Vec<String>, Vec<String>)
where
    F: Fn(&str) -> bool,
{
    let mut accepted: Vec<String> = Vec::new();
    let mut rejected = Vec::new();
    for name in names {
        let name = name.trim();
        if is_valid(name) {
            if !accepted.iter().any(|n| n == name) {
                accepted.push(name.to_string());
            }
        } else {
            rejected.push(name.to_string());
        }
    }
    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert!(is_valid_metric("activeUsers"));
        assert!(!is_valid_metric("bogusMetric"));
        assert!(is_valid_dimension("pagePath"));
        assert!(!is_valid_dimension("activeUsers"));
    }

    #[test]
    fn test_partition_preserves_order_and_dedups() {
        let names = vec![
            "sessions".to_string(),
            "bogusMetric".to_string(),
            "activeUsers".to_string(),
            "sessions".to_string(),
        ];
        let (ok, bad) = partition_valid(&names, is_valid_metric);
        assert_eq!(ok, vec!["sessions", "activeUsers"]);
        assert_eq!(bad, vec!["bogusMetric"]);
    }

    #[test]
    fn test_allow_lists_sorted() {
        let metrics = allowed_metrics();
        let mut sorted = metrics.clone();
        sorted.sort_unstable();
        assert_eq!(metrics, sorted);
        assert!(allowed_dimensions().contains(&"date"));
    }
}
