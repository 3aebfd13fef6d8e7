use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use video_ledger::{HistorySet, Ledger, LedgerError};

#[derive(Clone, Default)]
pub struct MockLedger {
    pub recorded: Arc<Mutex<HashSet<String>>>,
    pub loads: Arc<Mutex<usize>>,
    pub fail_load_with: Option<String>,
    pub fail_append_with: Option<String>,
}

impl MockLedger {
    pub fn failing_load(msg: &str) -> Self {
        Self {
            fail_load_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_append(msg: &str) -> Self {
        Self {
            fail_append_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn io_error(msg: &str) -> LedgerError {
        LedgerError::Io {
            path: "mock".into(),
            source: std::io::Error::other(msg.to_string()),
        }
    }
}

impl Ledger for MockLedger {
    async fn load_history(&self) -> Result<HistorySet, LedgerError> {
        *self.loads.lock().unwrap() += 1;
        if let Some(ref msg) = self.fail_load_with {
            return Err(Self::io_error(msg));
        }
        Ok(self.recorded.lock().unwrap().clone())
    }

    async fn append(&self, video_id: &str) -> Result<(), LedgerError> {
        if let Some(ref msg) = self.fail_append_with {
            return Err(Self::io_error(msg));
        }
        self.recorded.lock().unwrap().insert(video_id.to_string());
        Ok(())
    }
}
