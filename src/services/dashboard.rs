//! Dashboard service
//!
//! Aggregates the numbers shown on the admin landing page: catalog
//! totals, recent activity, a seven-day upload history with a trend
//! percentage, the upcoming publication queue and derived insights.
//!
//! All panels load together. If any of the underlying queries fails the
//! whole dashboard fails, so the page never renders a mix of fresh and
//! missing numbers.

use crate::backend::BackendError;
use crate::models::{Media, Model};
use crate::repositories::{MediaRepository, ModelRepository};
use chrono::{Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Rows shown in each "recent" panel
const RECENT_LIMIT: usize = 5;

/// Upcoming scheduled posts to surface
const SCHEDULED_LIMIT: usize = 5;

/// Length of the upload history window, in days
pub const UPLOAD_HISTORY_DAYS: usize = 7;

/// Fewer scheduled posts than this counts as a content shortage
const BACKLOG_COMFORT_LEVEL: i64 = 3;

/// Error types for dashboard operations
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// A backend query failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// One day of the upload history, labelled `DD/MM`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadBucket {
    pub day: String,
    pub count: i64,
}

/// Derived catalog health numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Uploads inside the history window
    pub total_uploads: i64,
    /// Uploads per day, rounded to one decimal
    pub daily_average: f64,
    /// Scheduled posts still waiting to publish
    pub scheduled_backlog: i64,
    /// Whether the publication queue is running low
    pub needs_content: bool,
}

/// Everything the admin dashboard renders
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_models: i64,
    pub total_media: i64,
    pub recent_models: Vec<Model>,
    pub recent_media: Vec<Media>,
    pub upload_history: Vec<UploadBucket>,
    pub upload_trend: f64,
    pub scheduled: Vec<Media>,
    pub insights: Insights,
}

/// Dashboard service aggregating catalog metrics
pub struct DashboardService {
    models: Arc<dyn ModelRepository>,
    media: Arc<dyn MediaRepository>,
}

impl DashboardService {
    /// Create a new dashboard service
    pub fn new(models: Arc<dyn ModelRepository>, media: Arc<dyn MediaRepository>) -> Self {
        Self { models, media }
    }

    /// Load the full dashboard.
    ///
    /// Runs the four underlying queries concurrently and fails as a
    /// whole if any of them fails.
    pub async fn load(&self) -> Result<Dashboard, DashboardError> {
        let now = Utc::now();
        let since = now - Duration::days(UPLOAD_HISTORY_DAYS as i64);

        let ((recent_models, total_models), (recent_media, total_media), upload_times, scheduled) =
            futures::try_join!(
                self.models.recent(RECENT_LIMIT),
                self.media.recent_with_owner(RECENT_LIMIT),
                self.media.created_since(since),
                self.media.scheduled_after(now, SCHEDULED_LIMIT),
            )?;

        let today = Local::now().date_naive();
        let upload_days: Vec<NaiveDate> = upload_times
            .iter()
            .map(|t| t.with_timezone(&Local).date_naive())
            .collect();

        let upload_history = bucket_uploads(&upload_days, today);
        let trend = upload_trend(&upload_history);
        let insights = derive_insights(&upload_history, scheduled.len() as i64);

        Ok(Dashboard {
            total_models,
            total_media,
            recent_models,
            recent_media,
            upload_history,
            upload_trend: trend,
            scheduled,
            insights,
        })
    }
}

/// Bucket upload days into a fixed window ending at `today`.
///
/// Produces one bucket per day, oldest first, labelled `DD/MM`. Days
/// with no uploads stay at zero; days outside the window are dropped.
pub fn bucket_uploads(days: &[NaiveDate], today: NaiveDate) -> Vec<UploadBucket> {
    let start = today - Duration::days(UPLOAD_HISTORY_DAYS as i64 - 1);

    let mut counts = [0i64; UPLOAD_HISTORY_DAYS];
    for day in days {
        let offset = (*day - start).num_days();
        if (0..UPLOAD_HISTORY_DAYS as i64).contains(&offset) {
            counts[offset as usize] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| UploadBucket {
            day: (start + Duration::days(i as i64)).format("%d/%m").to_string(),
            count,
        })
        .collect()
}

/// Percentage change between the two halves of the upload history,
/// rounded to one decimal.
///
/// The earlier half is the first `len / 2` buckets. A flat zero
/// history reports 0; growth from a zero earlier half reports 100.
pub fn upload_trend(history: &[UploadBucket]) -> f64 {
    let mid = history.len() / 2;
    let earlier: i64 = history[..mid].iter().map(|b| b.count).sum();
    let later: i64 = history[mid..].iter().map(|b| b.count).sum();

    if earlier == 0 {
        return if later > 0 { 100.0 } else { 0.0 };
    }

    let change = (later - earlier) as f64 / earlier as f64 * 100.0;
    (change * 10.0).round() / 10.0
}

fn derive_insights(history: &[UploadBucket], scheduled_backlog: i64) -> Insights {
    let total_uploads: i64 = history.iter().map(|b| b.count).sum();
    let daily_average = if history.is_empty() {
        0.0
    } else {
        (total_uploads as f64 / history.len() as f64 * 10.0).round() / 10.0
    };

    Insights {
        total_uploads,
        daily_average,
        scheduled_backlog,
        needs_content: scheduled_backlog < BACKLOG_COMFORT_LEVEL,
    }
}
