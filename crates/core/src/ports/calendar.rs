//! Port interface for the calendar scraper (C5).
//!
//! The upstream endpoint only returns one month per call; implementations
//! hide the monthly paging behind `get_events_for_range`. The convenience
//! query helpers below are thin filters over it, kept as part of the
//! scraper's public surface for diagnostics and manual inspection even
//! though the reconciler only calls `get_events_for_range`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use pulsearc_domain::{SyncResult, UpstreamEvent, User};

#[async_trait]
pub trait CalendarScraper: Send + Sync {
    /// Page monthly event listings and stitch them into a single list
    /// covering `[start, end]`. A single month's failure is logged and
    /// skipped — a partial range is preferred to a total failure.
    async fn get_events_for_range(&self, start: NaiveDate, end: NaiveDate) -> SyncResult<Vec<UpstreamEvent>>;

    /// Events for a single discipline code within `[start, end]`.
    async fn get_events_by_discipline(
        &self,
        discipline_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SyncResult<Vec<UpstreamEvent>> {
        let events = self.get_events_for_range(start, end).await?;
        Ok(events
            .into_iter()
            .filter(|e| e.discipline_code.as_deref() == Some(discipline_code))
            .collect())
    }

    /// Events taught by `instructor` within `[start, end]`.
    async fn get_events_by_teacher(
        &self,
        instructor: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SyncResult<Vec<UpstreamEvent>> {
        let events = self.get_events_for_range(start, end).await?;
        Ok(events.into_iter().filter(|e| e.instructor.as_deref() == Some(instructor)).collect())
    }

    /// The 7-day window containing `anchor`.
    async fn get_weekly_schedule(&self, anchor: NaiveDate) -> SyncResult<Vec<UpstreamEvent>> {
        let start = anchor;
        let end = anchor + Duration::days(6);
        self.get_events_for_range(start, end).await
    }

    /// Events for the current day, evaluated at `now`.
    async fn get_today_events(&self, now: DateTime<Utc>) -> SyncResult<Vec<UpstreamEvent>> {
        let today = now.date_naive();
        self.get_events_for_range(today, today).await
    }
}

/// Produces a scraper scoped to one user's portal session. Owns the C3
/// login handshake (using the user's stored ciphertext password, `encrypt =
/// false` per §9) so the orchestrator never touches the portal session
/// directly.
#[async_trait]
pub trait CalendarScraperFactory: Send + Sync {
    async fn scraper_for(&self, user: &User) -> SyncResult<Arc<dyn CalendarScraper>>;
}
