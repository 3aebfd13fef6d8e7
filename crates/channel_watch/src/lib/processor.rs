use std::{
    collections::{HashMap, HashSet},
    panic::AssertUnwindSafe,
    time::Duration,
};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use video_ledger::{HistorySet, Ledger, VideoRecord};

use crate::{
    config::Schedule,
    error::Error,
    llm::{AnalysisError, ReportGenerator},
    notify::Notifier,
    yt::{ChannelScanner, MediaFetcher},
};

pub mod builder;

/// How a single video's fetch/analyze/notify/commit pipeline ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Recorded in the ledger, artifact removed
    Committed,
    /// Not recorded, artifact (if any) kept for the next iteration
    RetryLater,
    /// Not recorded, artifact kept, the whole loop has to cool down
    RateLimited,
    /// Stopped before the next collaborator call, nothing recorded
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// The scanner had nothing to offer
    NoVideo,
    AlreadyProcessed(String),
    /// Failed too many times during this process lifetime
    GaveUp(String),
    Processed {
        video_id: String,
        outcome: PipelineOutcome,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    pub channels: Vec<(String, ChannelOutcome)>,
    /// Set once any pipeline in the iteration was rate limited
    pub cooldown: bool,
    /// The iteration stopped early on cancellation
    pub cancelled: bool,
    pub next_sleep: Duration,
}

/// Polls channels and turns every new video into a pushed report.
///
/// Channels are handled one after the other. A video is recorded in the
/// ledger only once its report has been generated; the ledger append is the
/// commit point, so a crash before it means the video is retried and a crash
/// after it means it is never reported twice.
pub struct ChannelWatcher<L, C, M, R, N>
where
    L: Ledger + Send + Sync + 'static,
    C: ChannelScanner + Send + Sync + 'static,
    M: MediaFetcher + Send + Sync + 'static,
    R: ReportGenerator + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    ledger: L,
    scanner: C,
    fetcher: M,
    generator: R,
    notifier: N,
    channels: Vec<String>,
    schedule: Schedule,
    max_content_retries: Option<u32>,
    failed_attempts: HashMap<String, u32>,
}

impl<L, C, M, R, N> ChannelWatcher<L, C, M, R, N>
where
    L: Ledger + Send + Sync + 'static,
    C: ChannelScanner + Send + Sync + 'static,
    M: MediaFetcher + Send + Sync + 'static,
    R: ReportGenerator + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Runs the pipeline for a video that is not in the ledger yet.
    ///
    /// `cancel` is checked before the download and before the analysis. Once
    /// a report exists it is delivered and committed regardless.
    #[tracing::instrument(skip_all, fields(video_id = %video.video_id, title = %video.title))]
    pub async fn process_video(
        &self,
        video: &VideoRecord,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, Error> {
        if cancel.is_cancelled() {
            tracing::info!("Cancelled before download");
            return Ok(PipelineOutcome::Cancelled);
        }

        let Some(artifact) = self.fetcher.fetch(&video.url, &video.video_id).await else {
            tracing::warn!(url = %video.url, "No audio artifact, retrying next iteration");
            return Ok(PipelineOutcome::RetryLater);
        };

        if cancel.is_cancelled() {
            tracing::info!(artifact = %artifact.display(), "Cancelled before analysis, keeping artifact");
            return Ok(PipelineOutcome::Cancelled);
        }

        let analysis = match self.generator.analyze(&artifact, &video.title).await {
            Ok(analysis) => analysis,
            Err(AnalysisError::QuotaExceeded(message)) => {
                tracing::warn!(
                    error = %message,
                    artifact = %artifact.display(),
                    "Report generator rate limited, keeping artifact for after the cooldown"
                );
                return Ok(PipelineOutcome::RateLimited);
            }
            Err(AnalysisError::Content(message)) => {
                tracing::error!(
                    error = %message,
                    artifact = %artifact.display(),
                    "Analysis failed, keeping artifact for the next attempt"
                );
                return Ok(PipelineOutcome::RetryLater);
            }
        };

        let report = compose_report(video, &analysis);
        // a dead messaging channel must not cause endless re-analysis
        if let Err(e) = self.notifier.notify(&report).await {
            tracing::error!(error = ?e, "Failed to deliver report, committing anyway");
        }

        self.ledger
            .append(&video.video_id)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to record video as processed"))?;
        tracing::info!("Video processed");

        match tokio::fs::remove_file(&artifact).await {
            Ok(()) => tracing::debug!(artifact = %artifact.display(), "Removed artifact"),
            Err(e) => tracing::warn!(
                error = ?e,
                artifact = %artifact.display(),
                "Failed to remove artifact"
            ),
        }

        Ok(PipelineOutcome::Committed)
    }

    /// One pass over every channel. Stops early, before the next collaborator
    /// call, once `cancel` fires.
    ///
    /// Retry counts of videos no channel offered during a complete pass are
    /// dropped.
    #[tracing::instrument(skip_all)]
    pub async fn run_iteration(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<IterationReport, Error> {
        let mut history: HistorySet = self.ledger.load_history().await?;
        tracing::info!(
            recorded = history.len(),
            channels = self.channels.len(),
            "Starting iteration"
        );

        let mut report = IterationReport::default();
        let mut offered = HashSet::new();

        for channel in &self.channels {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let outcome = match self.scanner.scan(channel).await {
                None => {
                    tracing::info!(%channel, "No video found");
                    ChannelOutcome::NoVideo
                }
                Some(video) if cancel.is_cancelled() => {
                    tracing::info!(%channel, video_id = %video.video_id, "Cancelled after scan");
                    report.cancelled = true;
                    break;
                }
                Some(video) if history.contains(&video.video_id) => {
                    tracing::info!(%channel, video_id = %video.video_id, title = %video.title, "Already processed");
                    ChannelOutcome::AlreadyProcessed(video.video_id)
                }
                Some(video) => {
                    offered.insert(video.video_id.clone());
                    let failures = self
                        .failed_attempts
                        .get(&video.video_id)
                        .copied()
                        .unwrap_or_default();

                    if self.max_content_retries.is_some_and(|max| failures >= max) {
                        tracing::warn!(%channel, video_id = %video.video_id, title = %video.title, failures, "Giving up on video until restart");
                        ChannelOutcome::GaveUp(video.video_id)
                    } else {
                        tracing::info!(%channel, video_id = %video.video_id, title = %video.title, "New video");
                        let outcome = self.process_video(&video, cancel).await?;

                        match outcome {
                            PipelineOutcome::Committed => {
                                self.failed_attempts.remove(&video.video_id);
                                history.insert(video.video_id.clone());
                            }
                            PipelineOutcome::RetryLater => {
                                *self
                                    .failed_attempts
                                    .entry(video.video_id.clone())
                                    .or_default() += 1;
                            }
                            PipelineOutcome::RateLimited => report.cooldown = true,
                            PipelineOutcome::Cancelled => report.cancelled = true,
                        }

                        ChannelOutcome::Processed {
                            video_id: video.video_id,
                            outcome,
                        }
                    }
                }
            };
            report.channels.push((channel.clone(), outcome));

            if report.cancelled {
                break;
            }
            if !sleep_or_cancel(self.schedule.channel_delay, cancel).await {
                report.cancelled = true;
                break;
            }
        }

        if !report.cancelled {
            self.failed_attempts.retain(|id, _| offered.contains(id));
        }

        report.next_sleep = if report.cooldown {
            self.schedule.cooldown
        } else {
            self.schedule.poll_interval
        };

        Ok(report)
    }

    /// Polls until `cancel` fires. Failed or panicking iterations are logged
    /// and retried after the regular poll interval.
    pub async fn run(&mut self, cancel: CancellationToken) {
        tracing::info!(channels = ?self.channels, "Channel watcher started");

        while !cancel.is_cancelled() {
            let iteration = AssertUnwindSafe(self.run_iteration(&cancel))
                .catch_unwind()
                .await;

            let next_sleep = match iteration {
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    tracing::error!(panic = %message, "Iteration panicked");
                    self.schedule.poll_interval
                }
                Ok(Ok(report)) if report.cancelled => break,
                Ok(Ok(report)) if report.cooldown => {
                    tracing::warn!(
                        secs = report.next_sleep.as_secs(),
                        "Report generator rate limited, cooling down"
                    );
                    report.next_sleep
                }
                Ok(Ok(report)) => {
                    tracing::info!(secs = report.next_sleep.as_secs(), "Waiting for next poll");
                    report.next_sleep
                }
                Ok(Err(e)) => {
                    tracing::error!(error = ?e, "Iteration failed");
                    self.schedule.poll_interval
                }
            };

            if !sleep_or_cancel(next_sleep, &cancel).await {
                break;
            }
        }

        tracing::warn!("Channel watcher stopped");
    }
}

/// Url header followed by the generated brief
pub fn compose_report(video: &VideoRecord, analysis: &str) -> String {
    format!("{}\n\n{}", video.url, analysis)
}

/// Returns false when cancelled before `duration` elapsed
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
