use std::{fmt::Display, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use log::LevelFilter;
use prettylog::{
    config::{ConfigManager, LocalConfigManager},
    ConsoleSink, FormatterConfig, Logger, PrettyFormatter,
};

mod info;
mod write;

#[derive(Subcommand, Debug)]
pub enum PlogCmd {
    Write(write::Cmd),

    Info(info::Cmd),
}

impl Display for PlogCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlogCmd::Write(_cmd) => write!(f, "write"),
            PlogCmd::Info(_cmd) => write!(f, "info"),
        }
    }
}

#[derive(Parser)]
#[command(version, long_version = "")]
#[command(about = "Pretty, rotating file logging fed from stdin.", long_about = None, disable_help_subcommand = true)]
pub struct Plog {
    #[arg(
        global = true,
        long,
        help = "Folder holding the rotating log files. Defaults to $XDG_DATA_HOME/prettylog/logs.",
        display_order = 0
    )]
    pub folder: Option<PathBuf>,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Write verbose messages to stderr for debugging.",
        display_order = 999
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: PlogCmd,
}

impl Plog {
    fn log_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            5 => LevelFilter::Trace,
            6_u8..=u8::MAX => LevelFilter::max(),
        }
    }

    fn setup_logging(&self) -> eyre::Result<()> {
        let formatter = PrettyFormatter::new(FormatterConfig {
            method_count: 0,
            show_thread_info: false,
            tag: Some("plog".to_string()),
            ..FormatterConfig::new(Arc::new(ConsoleSink::new()))
        });

        Logger::new(self.log_filter(), formatter, Box::new(ConsoleSink::new())).init()
    }

    pub fn run(self) -> eyre::Result<()> {
        self.setup_logging()?;

        log::info!(target: "plog", "running command {}", &self.cmd);
        log::trace!(target: "plog", "log level: {}", self.log_filter());

        let config = LocalConfigManager::with_folder(self.folder.clone());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let result = runtime.block_on(self.invoke_sub_command(config));

        if let Err(msg) = &result {
            log::error!(target: "plog", "failed running command {}, error={} cause={}", &self.cmd, msg, msg.root_cause());
        }

        result
    }

    async fn invoke_sub_command<T>(&self, config: T) -> eyre::Result<()>
    where
        T: ConfigManager,
    {
        match &self.cmd {
            PlogCmd::Write(write) => write.run(&config).await,
            PlogCmd::Info(info) => info.run(&config).await,
        }
    }
}
