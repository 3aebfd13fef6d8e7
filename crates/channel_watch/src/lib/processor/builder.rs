use std::{collections::HashMap, time::Duration};

use video_ledger::Ledger;

use crate::{
    config::Schedule,
    llm::ReportGenerator,
    notify::Notifier,
    processor::ChannelWatcher,
    yt::{ChannelScanner, MediaFetcher},
};

pub struct ChannelWatcherBuilder<L = (), C = (), M = (), R = (), N = ()> {
    ledger: L,
    scanner: C,
    fetcher: M,
    generator: R,
    notifier: N,
    channels: Vec<String>,
    schedule: Schedule,
    max_content_retries: Option<u32>,
}

impl Default for ChannelWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelWatcherBuilder {
    pub fn new() -> Self {
        Self {
            ledger: (),
            scanner: (),
            fetcher: (),
            generator: (),
            notifier: (),
            channels: Vec::new(),
            schedule: Schedule::default(),
            max_content_retries: None,
        }
    }
}

impl<L, C, M, R, N> ChannelWatcherBuilder<L, C, M, R, N> {
    pub fn ledger<L2: Ledger + Send + Sync + 'static>(
        self,
        ledger: L2,
    ) -> ChannelWatcherBuilder<L2, C, M, R, N> {
        ChannelWatcherBuilder {
            ledger,
            scanner: self.scanner,
            fetcher: self.fetcher,
            generator: self.generator,
            notifier: self.notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
        }
    }

    pub fn scanner<C2: ChannelScanner + Send + Sync + 'static>(
        self,
        scanner: C2,
    ) -> ChannelWatcherBuilder<L, C2, M, R, N> {
        ChannelWatcherBuilder {
            ledger: self.ledger,
            scanner,
            fetcher: self.fetcher,
            generator: self.generator,
            notifier: self.notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
        }
    }

    pub fn fetcher<M2: MediaFetcher + Send + Sync + 'static>(
        self,
        fetcher: M2,
    ) -> ChannelWatcherBuilder<L, C, M2, R, N> {
        ChannelWatcherBuilder {
            ledger: self.ledger,
            scanner: self.scanner,
            fetcher,
            generator: self.generator,
            notifier: self.notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
        }
    }

    pub fn generator<R2: ReportGenerator + Send + Sync + 'static>(
        self,
        generator: R2,
    ) -> ChannelWatcherBuilder<L, C, M, R2, N> {
        ChannelWatcherBuilder {
            ledger: self.ledger,
            scanner: self.scanner,
            fetcher: self.fetcher,
            generator,
            notifier: self.notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
        }
    }

    pub fn notifier<N2: Notifier + Send + Sync + 'static>(
        self,
        notifier: N2,
    ) -> ChannelWatcherBuilder<L, C, M, R, N2> {
        ChannelWatcherBuilder {
            ledger: self.ledger,
            scanner: self.scanner,
            fetcher: self.fetcher,
            generator: self.generator,
            notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
        }
    }

    pub fn channels(mut self, channels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.schedule.poll_interval = poll_interval;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.schedule.cooldown = cooldown;
        self
    }

    pub fn channel_delay(mut self, channel_delay: Duration) -> Self {
        self.schedule.channel_delay = channel_delay;
        self
    }

    /// Failed attempts allowed per video before it is skipped until restart
    pub fn max_content_retries(mut self, max_content_retries: Option<u32>) -> Self {
        self.max_content_retries = max_content_retries;
        self
    }
}

impl<L, C, M, R, N> ChannelWatcherBuilder<L, C, M, R, N>
where
    L: Ledger + Send + Sync + 'static,
    C: ChannelScanner + Send + Sync + 'static,
    M: MediaFetcher + Send + Sync + 'static,
    R: ReportGenerator + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn build(self) -> ChannelWatcher<L, C, M, R, N> {
        ChannelWatcher {
            ledger: self.ledger,
            scanner: self.scanner,
            fetcher: self.fetcher,
            generator: self.generator,
            notifier: self.notifier,
            channels: self.channels,
            schedule: self.schedule,
            max_content_retries: self.max_content_retries,
            failed_attempts: HashMap::new(),
        }
    }
}
