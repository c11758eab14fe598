//! Poll-and-diff loop watching one centre for newly opened slots.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::model::{Centre, Session, Slot};
use crate::ports::{AlertSink, BookingError, BookingPort};

/// Wait between two consecutive polls, applied after every sample
/// including the first.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Slots of `current` whose interval does not appear in `previous`.
///
/// Pure set-membership diff: an interval already seen once in `previous`
/// is never new, even when `current` repeats it more often.
#[must_use]
pub fn new_slots(previous: &[Slot], current: &[Slot]) -> Vec<Slot> {
    current
        .iter()
        .copied()
        .filter(|slot| !previous.contains(slot))
        .collect()
}

/// Count slots per calendar day, ordered by day.
#[must_use]
pub fn slot_day_counts(slots: &[Slot]) -> Vec<(NaiveDate, usize)> {
    let mut counts = BTreeMap::new();

    for slot in slots {
        *counts.entry(slot.day()).or_insert(0_usize) += 1;
    }

    counts.into_iter().collect()
}

/// Long-running monitor for one centre.
///
/// Owns the authenticated [`Session`] and the resolved [`Centre`] for the
/// whole run; the only other state it keeps is the immediately preceding
/// sample, replaced every cycle.
pub struct SlotWatcher<P> {
    port: P,
    session: Session,
    centre: Centre,
    poll_interval: Duration,
}

impl<P: BookingPort> SlotWatcher<P> {
    /// Create a watcher with the default poll interval.
    #[must_use]
    pub fn new(port: P, session: Session, centre: Centre) -> Self {
        Self {
            port,
            session,
            centre,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the inter-poll delay.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until `cancel` fires or a poll fails.
    ///
    /// The first sample only establishes the baseline; from the second
    /// sample on, every cycle diffs against the immediately preceding one
    /// and delivers a single alert when new slots appear. Fetch, diff,
    /// and alert all complete before the inter-poll delay begins.
    ///
    /// # Errors
    ///
    /// Any [`BookingError`] from a poll ends the run: the session cannot
    /// be renewed, so retrying would only delay an accurate report.
    pub async fn run(
        &self,
        sink: &dyn AlertSink,
        cancel: CancellationToken,
    ) -> Result<(), BookingError> {
        let mut previous: Option<Vec<Slot>> = None;

        loop {
            tracing::info!(centre = %self.centre, "checking slots");

            let current = self.port.slots(&self.session, self.centre.id).await?;

            match previous.as_deref() {
                Some(seen) => {
                    let fresh = new_slots(seen, &current);
                    tracing::info!(count = fresh.len(), "new slots found");

                    if !fresh.is_empty() {
                        log_day_counts(&fresh);
                        sink.alert(&fresh).await;
                    }
                }
                // Nothing to diff against on the first cycle; report the
                // baseline instead.
                None => log_day_counts(&current),
            }

            previous = Some(current);

            tokio::select! {
                // Prefer cancellation over starting another cycle.
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

fn log_day_counts(slots: &[Slot]) {
    for (day, count) in slot_day_counts(slots) {
        tracing::info!(%day, count, "slots");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone as _, Utc};

    use crate::model::CentreId;

    use super::*;

    fn slot(hour: u32) -> Slot {
        Slot::starting_at(Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap())
    }

    fn centre() -> Centre {
        Centre {
            id: CentreId(7),
            location: "Ballyfermot".to_owned(),
            county: "Dublin".to_owned(),
        }
    }

    /// Booking port that replays a fixed poll script and cancels the
    /// token once the script is exhausted.
    struct ScriptedPort {
        polls: Mutex<VecDeque<Result<Vec<Slot>, BookingError>>>,
        cancel: CancellationToken,
    }

    impl ScriptedPort {
        fn new(
            polls: Vec<Result<Vec<Slot>, BookingError>>,
            cancel: CancellationToken,
        ) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
                cancel,
            }
        }
    }

    #[async_trait]
    impl BookingPort for ScriptedPort {
        async fn centres(&self, _session: &Session) -> Result<Vec<Centre>, BookingError> {
            Ok(vec![centre()])
        }

        async fn slots(
            &self,
            _session: &Session,
            _centre: CentreId,
        ) -> Result<Vec<Slot>, BookingError> {
            let mut polls = self.polls.lock().unwrap();
            let next = polls.pop_front().expect("poll script exhausted");

            if polls.is_empty() {
                self.cancel.cancel();
            }

            next
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<Vec<Slot>>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn alert(&self, new_slots: &[Slot]) {
            self.alerts.lock().unwrap().push(new_slots.to_vec());
        }
    }

    async fn run_script(
        polls: Vec<Result<Vec<Slot>, BookingError>>,
    ) -> (Result<(), BookingError>, Vec<Vec<Slot>>) {
        let cancel = CancellationToken::new();
        let port = ScriptedPort::new(polls, cancel.clone());
        let watcher = SlotWatcher::new(port, Session::new("abc123"), centre())
            .with_poll_interval(Duration::ZERO);
        let sink = RecordingSink::default();

        let outcome = watcher.run(&sink, cancel).await;
        let alerts = sink.alerts.into_inner().unwrap();

        (outcome, alerts)
    }

    #[test]
    fn diff_is_set_membership_on_intervals() {
        let (first, second, third) = (slot(9), slot(10), slot(11));

        assert_eq!(
            new_slots(&[first, second], &[first, second, third]),
            vec![third]
        );
        // a repeated known interval is not new
        assert_eq!(new_slots(&[first], &[first, first]), Vec::<Slot>::new());
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let sample = [slot(9), slot(9), slot(14)];

        assert!(new_slots(&sample, &sample).is_empty());
        assert!(new_slots(&[], &[]).is_empty());
    }

    #[test]
    fn day_counts_group_by_calendar_day() {
        let friday = slot(9);
        let saturday =
            Slot::starting_at(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap());

        let counts = slot_day_counts(&[friday, saturday, friday]);

        assert_eq!(
            counts,
            vec![(friday.day(), 2), (saturday.day(), 1)]
        );
    }

    #[tokio::test]
    async fn alerts_only_on_genuinely_new_slots() {
        let (first, second, third) = (slot(9), slot(10), slot(11));

        let (outcome, alerts) = run_script(vec![
            Ok(vec![first, second]),
            Ok(vec![first, second, third]),
            Ok(vec![first, second, third]),
        ])
        .await;

        outcome.unwrap();
        // first poll: baseline; second: [third] is new; third: unchanged
        assert_eq!(alerts, vec![vec![third]]);
    }

    #[tokio::test]
    async fn first_sample_never_alerts() {
        let (outcome, alerts) = run_script(vec![Ok(vec![slot(9), slot(10)])]).await;

        outcome.unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn poll_failure_ends_the_run() {
        let (outcome, alerts) = run_script(vec![
            Ok(vec![slot(9)]),
            Err(BookingError::Api {
                path: "/availabilities/slots/7".to_owned(),
                status: 500,
            }),
        ])
        .await;

        assert!(matches!(
            outcome.unwrap_err(),
            BookingError::Api { status: 500, .. }
        ));
        assert!(alerts.is_empty());
    }
}
