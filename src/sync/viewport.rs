use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::calendar::{ScheduleRecord, YearMonth};
use crate::sync::api::{ApiError, AppointmentApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportId(pub u32);

#[derive(Debug)]
pub struct ViewportResponse {
    pub viewport: ViewportId,
    pub seq: u64,
    pub range: (NaiveDate, NaiveDate),
    pub result: Result<Vec<ScheduleRecord>, ApiError>,
}

/// Fetches schedule records for one surface. Every request gets a new
/// sequence number and aborts the one in flight; only the response carrying
/// the latest number is ever accepted.
pub struct ViewportLoader {
    viewport: ViewportId,
    api: Arc<dyn AppointmentApi>,
    responses: mpsc::UnboundedSender<ViewportResponse>,
    latest: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl ViewportLoader {
    pub fn new(
        viewport: ViewportId,
        api: Arc<dyn AppointmentApi>,
        responses: mpsc::UnboundedSender<ViewportResponse>,
    ) -> Self {
        Self {
            viewport,
            api,
            responses,
            latest: 0,
            in_flight: None,
        }
    }

    pub fn viewport(&self) -> ViewportId {
        self.viewport
    }

    /// Loads every month touched by `start..=end`. Must be called inside a
    /// tokio runtime.
    pub fn request(&mut self, fixer_id: &str, start: NaiveDate, end: NaiveDate) -> u64 {
        self.cancel_in_flight();
        self.latest += 1;
        let seq = self.latest;

        let months = YearMonth::spanning(start, end);
        let api = Arc::clone(&self.api);
        let responses = self.responses.clone();
        let fixer_id = fixer_id.to_string();
        let viewport = self.viewport;
        tracing::debug!(
            "Viewport {} request {} for {} month(s) from {}",
            viewport.0,
            seq,
            months.len(),
            start
        );

        self.in_flight = Some(tokio::spawn(async move {
            let result = fetch_months(api.as_ref(), &fixer_id, &months).await;
            if let Err(e) = &result {
                tracing::warn!("Viewport {} request {} failed: {}", viewport.0, seq, e);
            }
            responses
                .send(ViewportResponse {
                    viewport,
                    seq,
                    range: (start, end),
                    result,
                })
                .ok();
        }));
        seq
    }

    pub fn abort(&mut self) {
        self.cancel_in_flight();
        self.latest += 1;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    pub fn accept(
        &mut self,
        response: ViewportResponse,
    ) -> Option<Result<Vec<ScheduleRecord>, ApiError>> {
        if response.viewport != self.viewport || response.seq != self.latest {
            tracing::debug!(
                "Discarding stale response {} for viewport {} (latest {})",
                response.seq,
                self.viewport.0,
                self.latest
            );
            return None;
        }
        self.in_flight = None;
        Some(response.result)
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for ViewportLoader {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

async fn fetch_months(
    api: &dyn AppointmentApi,
    fixer_id: &str,
    months: &[YearMonth],
) -> Result<Vec<ScheduleRecord>, ApiError> {
    let mut records = Vec::new();
    for month in months {
        records.extend(api.fetch_schedules(fixer_id, *month).await?);
    }
    Ok(records)
}
