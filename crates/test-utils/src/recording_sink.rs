use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use eventmgr::errors::Result;
use eventmgr::exec::CommandSink;

/// A fake sink that records every dispatched batch.
#[derive(Debug)]
pub struct RecordingSink<C> {
    batches: Arc<Mutex<Vec<Vec<C>>>>,
}

impl<C> RecordingSink<C> {
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded batches; stays valid after the sink is
    /// moved into a control loop.
    pub fn batches(&self) -> Arc<Mutex<Vec<Vec<C>>>> {
        Arc::clone(&self.batches)
    }
}

impl<C> Default for RecordingSink<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandSink<C> for RecordingSink<C>
where
    C: Send + 'static,
{
    fn dispatch(
        &mut self,
        commands: Vec<C>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let batches = Arc::clone(&self.batches);

        Box::pin(async move {
            batches.lock().unwrap().push(commands);
            Ok(())
        })
    }
}
