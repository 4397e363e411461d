//! Periodic signal strength updates.
//!
//! A subscription polls the record source on its own task and pushes every
//! result into a channel. Dropping the [`Subscription`] stops the task.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    task::{self, JoinHandle},
    time,
};
use tracing::{info, warn};

use crate::{
    metric::{Metric, MetricResult},
    resolve::resolve,
    source::RecordSource,
};

pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn subscribe(
    source: Arc<dyn RecordSource>,
    interval: Duration,
) -> (Subscription, mpsc::Receiver<MetricResult>) {
    let (tx, rx) = mpsc::channel(1);
    info!(interval_ms = interval.as_millis() as u64, "starting signal watch");

    let handle = task::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            ticker.tick().await;

            let result = match source.cell_records().await {
                Ok(records) => resolve(Metric::SignalStrength, &records),
                Err(e) => {
                    warn!(error = ?e, "could not query cell records");
                    MetricResult::Unavailable
                }
            };

            if tx.send(result).await.is_err() {
                // receiver dropped
                return;
            }
        }
    });

    (Subscription { handle }, rx)
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::model::{CellRecord, NrCell, Number};

    mock! {
        pub Source {}
        #[async_trait]
        impl RecordSource for Source {
            async fn cell_records(&self) -> Result<Vec<CellRecord>>;
        }
    }

    #[tokio::test]
    async fn pushes_updates() {
        let mut calls = 0;
        let mut source = MockSource::new();
        source.expect_cell_records().returning(move || {
            calls += 1;
            match calls {
                1 => Ok(vec![CellRecord::Nr(NrCell { dbm: Some(-90.0) })]),
                2 => Err(anyhow!("modem gone")),
                _ => Ok(Vec::new()),
            }
        });

        let (subscription, mut rx) = subscribe(Arc::new(source), Duration::from_millis(1));

        assert_eq!(rx.recv().await.unwrap().value(), Some(Number::Real(-90.0)));
        assert_eq!(rx.recv().await.unwrap(), MetricResult::Unavailable);
        assert_eq!(rx.recv().await.unwrap(), MetricResult::Unavailable);

        subscription.cancel();
    }

    #[tokio::test]
    async fn cancel_closes_channel() {
        let mut source = MockSource::new();
        source.expect_cell_records().returning(|| Ok(Vec::new()));

        let (subscription, mut rx) = subscribe(Arc::new(source), Duration::from_millis(1));
        subscription.cancel();

        // at most one value was buffered before the task stopped
        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert!(received <= 1);
    }
}
