// src/exec/backend.rs

//! Pluggable command sink abstraction.
//!
//! The control loop talks to a `CommandSink` instead of a raw mpsc sender.
//! This makes it easy to swap in a recording sink in tests while keeping the
//! production wiring simple.
//!
//! - `ChannelSink` forwards commands over an unbounded mpsc channel to whatever
//!   sits on the other end (the message bus, an autopilot bridge, a simulator).
//!   The receiver usually answers on the loop event channel, so a bounded leg
//!   here could leave both sides waiting on each other.
//! - `TracingSink` only logs the commands.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::info;

use crate::errors::{Error, Result};

/// Trait abstracting where dispatched commands go.
pub trait CommandSink<C>: Send {
    /// Deliver the given commands, in order.
    fn dispatch(
        &mut self,
        commands: Vec<C>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Sink that forwards every command over an unbounded mpsc channel.
///
/// `dispatch` never waits on the receiver.
pub struct ChannelSink<C> {
    tx: mpsc::UnboundedSender<C>,
}

impl<C> ChannelSink<C> {
    pub fn new(tx: mpsc::UnboundedSender<C>) -> Self {
        Self { tx }
    }
}

impl<C> CommandSink<C> for ChannelSink<C>
where
    C: Send + 'static,
{
    fn dispatch(
        &mut self,
        commands: Vec<C>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for command in commands {
                tx.send(command)
                    .map_err(|_| Error::msg("command channel closed"))?;
            }
            Ok(())
        })
    }
}

/// Sink that logs each command at `info` and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl<C> CommandSink<C> for TracingSink
where
    C: fmt::Debug + Send + 'static,
{
    fn dispatch(
        &mut self,
        commands: Vec<C>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for command in commands {
                info!(?command, "command issued");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_forwards_in_order_and_reports_closed_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let mut sink = ChannelSink::new(tx);

        sink.dispatch(vec![1, 2, 3]).await.unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));

        drop(rx);
        assert!(sink.dispatch(vec![4]).await.is_err());
    }

    #[tokio::test]
    async fn channel_sink_does_not_wait_for_an_idle_reader() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        let mut sink = ChannelSink::new(tx);

        let burst: Vec<u32> = (0..1_000).collect();
        tokio::time::timeout(std::time::Duration::from_secs(1), sink.dispatch(burst))
            .await
            .expect("dispatch waited on the reader")
            .unwrap();

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 1_000);
    }
}
