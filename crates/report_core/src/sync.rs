//! Report list synchronization: one bulk read plus a live change feed,
//! reconciled into a single ordered list.
//!
//! The snapshot read and the feed are opened together, so feed events can
//! arrive before the snapshot resolves. Those early events are buffered and
//! merged into the snapshot once it lands instead of being overwritten by it.

use std::collections::HashSet;

use report_logging::{report_debug, report_error, report_warn};

use crate::{ChangeEvent, Report, ReportId};

/// Tags every snapshot, event and close notification with the activation it
/// belongs to. Anything carrying a stale id is discarded.
pub type SubscriptionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Inactive,
    Loading {
        subscription: SubscriptionId,
        pending: Vec<ChangeEvent>,
    },
    Live {
        subscription: SubscriptionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportList {
    phase: Phase,
    reports: Vec<Report>,
    next_subscription: SubscriptionId,
    fetch_error: Option<String>,
    feed_open: bool,
}

impl ReportList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh view instance: empties the list and allocates the id
    /// under which the caller issues the snapshot read and opens the feed.
    pub fn activate(&mut self) -> SubscriptionId {
        if let Some(previous) = self.active_subscription() {
            report_warn!("activating over live subscription {previous}; dropping it");
        }
        self.next_subscription += 1;
        let subscription = self.next_subscription;
        self.phase = Phase::Loading {
            subscription,
            pending: Vec::new(),
        };
        self.reports.clear();
        self.fetch_error = None;
        self.feed_open = true;
        report_debug!("report list activated subscription={subscription}");
        subscription
    }

    /// Stops applying anything for the current subscription. Returns the id
    /// the caller must close, if one was open.
    pub fn deactivate(&mut self) -> Option<SubscriptionId> {
        let closed = self.active_subscription();
        self.phase = Phase::Inactive;
        self.feed_open = false;
        if let Some(subscription) = closed {
            report_debug!("report list deactivated subscription={subscription}");
        }
        closed
    }

    pub fn active_subscription(&self) -> Option<SubscriptionId> {
        match self.phase {
            Phase::Inactive => None,
            Phase::Loading { subscription, .. } | Phase::Live { subscription } => {
                Some(subscription)
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_subscription().is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// True while the feed for the current subscription has not reported closure.
    pub fn is_feed_open(&self) -> bool {
        self.is_active() && self.feed_open
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn get(&self, id: &ReportId) -> Option<&Report> {
        self.reports.iter().find(|report| &report.id == id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Applies the bulk read result. Returns whether anything was applied.
    pub fn apply_snapshot(
        &mut self,
        subscription: SubscriptionId,
        result: Result<Vec<Report>, String>,
    ) -> bool {
        let pending = match &mut self.phase {
            Phase::Loading {
                subscription: current,
                pending,
            } if *current == subscription => std::mem::take(pending),
            _ => {
                report_debug!("discarding snapshot for stale subscription={subscription}");
                return false;
            }
        };
        self.phase = Phase::Live { subscription };

        match result {
            Ok(rows) => {
                self.reports = normalize_snapshot(rows);
                for event in pending {
                    merge_buffered(&mut self.reports, event);
                }
            }
            Err(message) => {
                report_error!("report snapshot read failed: {message}");
                self.fetch_error = Some(message);
                self.reports.clear();
                for event in pending {
                    apply_live(&mut self.reports, event);
                }
            }
        }
        true
    }

    /// Applies or buffers one feed event. Returns whether the event was accepted.
    pub fn apply_change(&mut self, subscription: SubscriptionId, event: ChangeEvent) -> bool {
        match &mut self.phase {
            Phase::Loading {
                subscription: current,
                pending,
            } if *current == subscription => {
                pending.push(event);
                true
            }
            Phase::Live {
                subscription: current,
            } if *current == subscription => {
                apply_live(&mut self.reports, event);
                true
            }
            _ => {
                report_debug!(
                    "discarding {:?} for stale subscription={subscription}",
                    event.kind()
                );
                false
            }
        }
    }

    /// Records that the feed stopped delivering. There is no reconnect.
    pub fn feed_closed(&mut self, subscription: SubscriptionId, reason: Option<&str>) -> bool {
        if self.active_subscription() != Some(subscription) {
            return false;
        }
        match reason {
            Some(reason) => report_warn!("change feed closed: {reason}"),
            None => report_warn!("change feed ended"),
        }
        self.feed_open = false;
        true
    }
}

fn normalize_snapshot(mut rows: Vec<Report>) -> Vec<Report> {
    // Stable sort keeps the server's order among equal timestamps.
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|report| seen.insert(report.id.clone()));
    rows
}

fn position_of(reports: &[Report], id: &ReportId) -> Option<usize> {
    reports.iter().position(|report| &report.id == id)
}

/// Live rules: inserts are prepended without re-sorting, updates only touch
/// known ids, deletes are idempotent.
fn apply_live(reports: &mut Vec<Report>, event: ChangeEvent) {
    match event {
        ChangeEvent::Insert(report) => match position_of(reports, &report.id) {
            Some(index) => reports[index] = report,
            None => reports.insert(0, report),
        },
        ChangeEvent::Update(report) => match position_of(reports, &report.id) {
            Some(index) => reports[index] = report,
            None => report_debug!("update for unknown report {} dropped", report.id),
        },
        ChangeEvent::Delete { id } => reports.retain(|report| report.id != id),
    }
}

/// Replays an event that raced the snapshot. The snapshot may already be
/// newer than the event, so a record is only replaced when the event's status
/// is not behind it.
fn merge_buffered(reports: &mut Vec<Report>, event: ChangeEvent) {
    let (report, is_insert) = match event {
        ChangeEvent::Insert(report) => (report, true),
        ChangeEvent::Update(report) => (report, false),
        ChangeEvent::Delete { id } => {
            reports.retain(|report| report.id != id);
            return;
        }
    };

    match position_of(reports, &report.id) {
        Some(index) => {
            if report.status.rank() >= reports[index].status.rank() {
                reports[index] = report;
            }
        }
        None if is_insert => {
            let index = reports.partition_point(|existing| existing.created_at > report.created_at);
            reports.insert(index, report);
        }
        None => report_debug!("buffered update for {} not in snapshot; dropped", report.id),
    }
}
