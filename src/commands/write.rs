use std::sync::Arc;

use clap::Args;
use eyre::Context;
use prettylog::{
    config::ConfigManager, ConsoleSink, DiskLogWriter, FanOutSink, FormatterConfig, LogSink,
    PrettyFormatter, Priority,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct Cmd {
    #[arg(short, long, help = "Tag merged with the default PRETTY_LOGGER tag.")]
    pub tag: Option<String>,

    #[arg(
        short,
        long,
        default_value_t = 4,
        help = "Severity code: 2 verbose, 3 debug, 4 info, 5 warn, 6 error, 7 assert."
    )]
    pub priority: i32,

    #[arg(long, default_value_t = 2, help = "Caller frames printed above each message.")]
    pub method_count: usize,

    #[arg(long, default_value_t = 0, help = "Extra frames skipped before printing.")]
    pub method_offset: usize,

    #[arg(long, help = "Leave out the thread name line.")]
    pub no_thread_info: bool,

    #[arg(long, help = "Rotation ceiling in bytes for each log file.")]
    pub max_file_size: Option<u64>,

    #[arg(long, help = "Also print every block to stderr.")]
    pub console: bool,
}

impl Cmd {
    pub async fn run(&self, config: &impl ConfigManager) -> eyre::Result<()> {
        let mut disk_config = config.disk_config()?;
        if let Some(max_file_size) = self.max_file_size {
            disk_config = disk_config.with_max_file_size(max_file_size);
        }

        let disk = Arc::new(DiskLogWriter::new(disk_config)?);
        let mut sink = FanOutSink::new(vec![disk.clone() as Arc<dyn LogSink>]);
        if self.console {
            sink.push(Arc::new(ConsoleSink::new()));
        }

        let formatter = PrettyFormatter::new(FormatterConfig {
            method_count: self.method_count,
            method_offset: self.method_offset,
            show_thread_info: !self.no_thread_info,
            ..FormatterConfig::new(Arc::new(sink))
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut count = 0usize;
        while let Some(line) = lines.next_line().await.context("Failed reading stdin")? {
            formatter.log(Priority(self.priority), self.tag.as_deref(), &line);
            count += 1;
        }

        disk.flush_async().await?;
        disk.shutdown()?;
        log::info!(target: "plog", "wrote {} records to {}", count, disk.folder().display());

        Ok(())
    }
}
