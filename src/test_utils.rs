use crate::error::PassSummaryError;
use crate::models::{Pass, PassCollection};
use crate::upstream::PassSource;

use std::sync::Mutex;

/// The three passes used throughout the tests, with a total ascent of 6518.
pub(crate) fn get_test_passes() -> PassCollection {
    vec![
        Pass::new(1, "Grosse Scheidegg", "Switzerland", 1900),
        Pass::new(2, "Stelvio Pass", "Italy", 2758),
        Pass::new(3, "Alpe d'Huez", "France", 1860),
    ]
}

/// In-memory [PassSource] that records the ID of every individual fetch.
pub(crate) struct RecordingPassSource {
    passes: PassCollection,
    requested_ids: Mutex<Vec<i64>>,
}

impl RecordingPassSource {
    pub(crate) fn new(passes: PassCollection) -> Self {
        Self {
            passes,
            requested_ids: Mutex::new(vec![]),
        }
    }

    /// IDs passed to `fetch_by_id`, in call order.
    pub(crate) fn requested_ids(&self) -> Vec<i64> {
        self.requested_ids.lock().unwrap().clone()
    }
}

impl PassSource for RecordingPassSource {
    async fn fetch_all(&self) -> Result<PassCollection, PassSummaryError> {
        Ok(self.passes.clone())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Pass, PassSummaryError> {
        self.requested_ids.lock().unwrap().push(id);
        self.passes
            .iter()
            .find(|pass| pass.id == id)
            .cloned()
            .ok_or(PassSummaryError::NotFound { id })
    }
}
