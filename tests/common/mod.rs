//! Shared helpers for the end-to-end suites.

use std::sync::{Arc, Mutex};

use scenepipe::{Config, ModuleContext, Pipeline, ValueMap};

/// Resolved configs seen by `test.Record`, in call order.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<ValueMap>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<ValueMap> {
        self.seen.lock().unwrap().clone()
    }
}

/// Built-in pipeline plus a `test.Record` module that stores its config.
pub fn recording_pipeline() -> (Pipeline, Recorder) {
    let recorder = Recorder::default();
    let seen = recorder.seen.clone();
    let mut pipeline = Pipeline::new();
    pipeline.register_module_fn("test.Record", move |config: &Config, _: &mut ModuleContext<'_>| {
        seen.lock().unwrap().push(config.values().clone());
        Ok(())
    });
    (pipeline, recorder)
}
