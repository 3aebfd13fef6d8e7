pub mod channel_scanner;
pub mod ledger;
pub mod media_fetcher;
pub mod notifier;
pub mod report_generator;
