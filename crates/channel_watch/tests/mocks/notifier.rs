use std::sync::{Arc, Mutex};
use channel_watch::{Notifier, NotifyError};

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockNotifier {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Notifier for MockNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(NotifyError::Api {
                status: 500,
                message: msg.clone(),
            });
        }
        Ok(())
    }
}
