use clap::{Args, CommandFactory, ValueEnum};
use prettylog::{config::ConfigManager, disk::list_log_files};
use serde_json::json;

use crate::commands::Plog;

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputType {
    Text,
    Json,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cmd {
    #[arg(long, short, value_enum, default_value_t=OutputType::Text)]
    pub output: OutputType,
}

impl Cmd {
    pub async fn run(&self, config: &impl ConfigManager) -> eyre::Result<()> {
        let disk_config = config.disk_config()?;
        let files = list_log_files(&disk_config.folder);

        match self.output {
            OutputType::Text => {
                println!(
                    "Version:        {}",
                    Plog::command().get_version().unwrap_or("")
                );
                println!("Log folder:     {}", disk_config.folder.display());
                println!("Max file size:  {} bytes", disk_config.max_file_size);
                println!("Files:          {}", files.len());
                for file in &files {
                    println!("  {}  {} bytes", file.path.display(), file.size);
                }
            }
            OutputType::Json => {
                let files: Vec<_> = files
                    .iter()
                    .map(|file| {
                        json!({
                            "index": file.index,
                            "path": file.path.display().to_string(),
                            "size": file.size,
                        })
                    })
                    .collect();

                let info = json!({
                    "version": Plog::command().get_version(),
                    "folder": disk_config.folder.display().to_string(),
                    "max_file_size": disk_config.max_file_size,
                    "files": files,
                });
                println!("{}", info);
            }
        }

        Ok(())
    }
}
