use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use channel_watch::{AnalysisError, ReportGenerator};

/// Answers with `report` unless a scripted result is queued for the title
#[derive(Clone)]
pub struct MockReportGenerator {
    pub report: String,
    pub scripted: Arc<Mutex<HashMap<String, VecDeque<Result<String, AnalysisError>>>>>,
    pub always_fail_with: Option<AnalysisError>,
    pub calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl MockReportGenerator {
    pub fn new(report: &str) -> Self {
        Self {
            report: report.to_string(),
            scripted: Arc::new(Mutex::new(HashMap::new())),
            always_fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: AnalysisError) -> Self {
        Self {
            always_fail_with: Some(error),
            ..Self::new("")
        }
    }

    pub fn then(self, title: &str, result: Result<String, AnalysisError>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(title.to_string())
            .or_default()
            .push_back(result);
        self
    }
}

impl ReportGenerator for MockReportGenerator {
    async fn analyze(&self, audio_path: &Path, title: &str) -> Result<String, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((audio_path.to_path_buf(), title.to_string()));

        if let Some(ref error) = self.always_fail_with {
            return Err(error.clone());
        }

        self.scripted
            .lock()
            .unwrap()
            .get_mut(title)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(self.report.clone()))
    }
}
