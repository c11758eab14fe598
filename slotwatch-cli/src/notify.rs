//! Alert sinks delivering "new slots found" events to the operator.

use std::io::{self, Write as _};
use std::time::Duration;

use async_trait::async_trait;
use slotwatch_core::{slot_day_counts, AlertSink, Slot};

/// Prints the alert and its per-day breakdown to standard output.
pub struct ConsoleAlert;

#[async_trait]
impl AlertSink for ConsoleAlert {
    #[expect(clippy::print_stdout, reason = "operator-facing alert output")]
    async fn alert(&self, new_slots: &[Slot]) {
        println!(">>> {} new slots found", new_slots.len());

        for (day, count) in slot_day_counts(new_slots) {
            println!("> {day}: {count} slots");
        }
    }
}

/// Rings the terminal bell a few times per alert.
pub struct TerminalBell {
    rings: u32,
}

impl TerminalBell {
    /// A bell that rings `rings` times per alert.
    #[must_use]
    pub fn new(rings: u32) -> Self {
        Self { rings }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl AlertSink for TerminalBell {
    async fn alert(&self, _new_slots: &[Slot]) {
        for _ in 0..self.rings {
            if write!(io::stdout(), "\x07")
                .and_then(|()| io::stdout().flush())
                .is_err()
            {
                tracing::debug!("could not ring terminal bell");
                return;
            }

            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    }
}

/// Fans one alert event out to every registered sink, so the audible and
/// the visual channel both fire on the same event.
pub struct CompositeAlert {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl CompositeAlert {
    /// Bundle the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AlertSink for CompositeAlert {
    async fn alert(&self, new_slots: &[Slot]) {
        for sink in &self.sinks {
            sink.alert(new_slots).await;
        }
    }
}
