//! Progress reporting for catalog builds.
//!
//! The scanner reports each newly cataloged container-backed title. Sinks must
//! return quickly: scanning waits on them.

use std::sync::mpsc::Sender;

/// Receives titles as they are cataloged.
pub trait ProgressSink: Send + Sync {
    fn on_title_cataloged(&self, _title: &str) {}
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {}

/// Forward titles over a channel. A closed receiver is ignored so a
/// consumer can stop listening without stopping the build.
impl ProgressSink for Sender<String> {
    fn on_title_cataloged(&self, title: &str) {
        let _ = self.send(title.to_string());
    }
}

/// Log each title at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_title_cataloged(&self, title: &str) {
        tracing::info!(title, "Cataloged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (tx, rx) = mpsc::channel::<String>();
        tx.on_title_cataloged("Panzer Dragoon");
        tx.on_title_cataloged("Virtua Fighter 2");
        assert_eq!(rx.try_recv().unwrap(), "Panzer Dragoon");
        assert_eq!(rx.try_recv().unwrap(), "Virtua Fighter 2");
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(rx);
        tx.on_title_cataloged("Saturn Bomberman");
    }
}
