use super::{Record, RecordValue, Recorder};
use log::info;
use std::collections::BTreeMap;

/// A recorder that aggregates stored scalars and reports them through
/// [`log`].
///
/// Scalars stored between two `flush` calls are averaged per key; other
/// value types are written as-is with [`Recorder::write`].
pub struct LogRecorder {
    stored: Vec<Record>,
}

#[allow(clippy::new_without_default)]
impl LogRecorder {
    /// Constructs a [`LogRecorder`].
    pub fn new() -> Self {
        Self { stored: Vec::new() }
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        for (k, v) in record.iter() {
            match v {
                RecordValue::Scalar(v) => info!("{} = {}", k, v),
                RecordValue::String(s) => info!("{} = {}", k, s),
                RecordValue::DateTime(t) => info!("{} = {}", k, t),
            }
        }
    }

    fn store(&mut self, record: Record) {
        self.stored.push(record);
    }

    fn flush(&mut self, step: i64) {
        // (sum, count) per key, in key order
        let mut agg: BTreeMap<String, (f32, usize)> = BTreeMap::new();
        for record in self.stored.drain(..) {
            for (k, v) in record.iter() {
                if let RecordValue::Scalar(v) = v {
                    let e = agg.entry(k.clone()).or_insert((0.0, 0));
                    e.0 += v;
                    e.1 += 1;
                }
            }
        }
        if agg.is_empty() {
            return;
        }
        let line = agg
            .iter()
            .map(|(k, (sum, n))| format!("{} = {:.5}", k, sum / *n as f32))
            .collect::<Vec<_>>()
            .join(", ");
        info!("step {}: {}", step, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_drains_stored_records() {
        let mut recorder = LogRecorder::new();
        recorder.store(Record::from_scalar("loss", 1.0));
        recorder.store(Record::from_scalar("loss", 3.0));
        assert_eq!(recorder.stored.len(), 2);
        recorder.flush(1);
        assert!(recorder.stored.is_empty());
    }
}
