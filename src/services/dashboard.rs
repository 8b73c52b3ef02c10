//! Dashboard statistics: all-time and trailing-month story counts.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::store::StoryStore;

/// Story counts shown by the dashboard widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(rename = "totalStories")]
    pub total_stories: u64,
    #[serde(rename = "totalStories30")]
    pub total_stories_30: u64,
}

/// Start of the trailing window: `now` with the month decremented and the
/// day-of-month and time kept.
///
/// A day that does not exist in the previous month overflows into the
/// following one, so 31 March becomes 2 March (1 March outside leap years).
pub fn stats_cutoff(now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    let (year, month) = match now.month() {
        1 => (now.year() - 1, 12),
        m => (now.year(), m - 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(now.day() - 1))))
        .map(|date| date.and_time(now.time()).and_utc())
        .ok_or_else(|| AppError::Internal(format!("Cannot subtract a month from {now}")))
}

/// Fetch dashboard statistics as of the current time.
pub async fn get_stats<S: StoryStore + ?Sized>(store: &S) -> Result<DashboardStats, AppError> {
    get_stats_at(store, Utc::now()).await
}

/// Fetch dashboard statistics as of `now`.
pub async fn get_stats_at<S: StoryStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<DashboardStats, AppError> {
    let cutoff = stats_cutoff(now)?;

    let (all, recent) = tokio::try_join!(
        store.find_all_stories(),
        store.find_stories_created_after(cutoff),
    )?;

    let total_stories = all.len() as u64;
    // The reads are not one snapshot; an insert between them must not push
    // the window count past the total.
    let total_stories_30 = (recent.len() as u64).min(total_stories);

    tracing::debug!(total_stories, total_stories_30, %cutoff, "Computed dashboard stats");

    Ok(DashboardStats {
        total_stories,
        total_stories_30,
    })
}
