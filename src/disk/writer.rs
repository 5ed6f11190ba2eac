use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    thread::{self, JoinHandle},
};

use eyre::{eyre, Context};
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};

use super::{is_io_error, rotation::RotatingFileManager};
use crate::{
    config::DiskConfig,
    logging::{LogRecord, LogSink, Priority, DIAGNOSTIC_TARGET},
};

/// Destination the worker thread appends to. The worker owns it exclusively.
trait RecordWriter: Send + 'static {
    fn write(&mut self, content: &str) -> eyre::Result<()>;

    fn close(&mut self) -> eyre::Result<()>;
}

impl RecordWriter for RotatingFileManager {
    fn write(&mut self, content: &str) -> eyre::Result<()> {
        RotatingFileManager::write(self, content)
    }

    fn close(&mut self) -> eyre::Result<()> {
        RotatingFileManager::close(self)
    }
}

enum WriterCommand {
    Write(LogRecord),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Disk sink that hands every record to a single background thread.
///
/// `log` only enqueues. The worker owns the [`RotatingFileManager`] and
/// processes the queue strictly in order, so records reach the disk in the
/// order they were enqueued no matter how many threads produce them.
/// Dropping the writer drains the queue before the file is closed.
pub struct DiskLogWriter {
    sender: UnboundedSender<WriterCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    folder: PathBuf,
    drop_reported: AtomicBool,
}

impl DiskLogWriter {
    pub fn new(config: DiskConfig) -> eyre::Result<Self> {
        let manager = RotatingFileManager::new(&config);
        Self::spawn(config.folder, manager)
    }

    fn spawn<W: RecordWriter>(folder: PathBuf, writer: W) -> eyre::Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();

        tracing::debug!(
            target: DIAGNOSTIC_TARGET,
            "starting disk writer for {}",
            folder.display()
        );
        let worker = thread::Builder::new()
            .name("prettylog-disk-writer".into())
            .spawn(move || Self::run(writer, receiver))
            .context("Failed spawning disk writer thread")?;

        Ok(Self {
            sender,
            worker: Mutex::new(Some(worker)),
            folder,
            drop_reported: AtomicBool::new(false),
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Blocks until every record enqueued before this call has been written.
    ///
    /// Must not be called from inside an async runtime, use [`Self::flush_async`]
    /// there.
    pub fn flush(&self) -> eyre::Result<()> {
        let receiver = self.request_flush()?;
        receiver
            .blocking_recv()
            .context("Disk writer stopped before flushing")
    }

    pub async fn flush_async(&self) -> eyre::Result<()> {
        let receiver = self.request_flush()?;
        receiver.await.context("Disk writer stopped before flushing")
    }

    fn request_flush(&self) -> eyre::Result<oneshot::Receiver<()>> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(WriterCommand::Flush(reply))
            .map_err(|_| eyre!("Disk writer is not running"))?;
        Ok(receiver)
    }

    /// Drains the queue, closes the current file and joins the worker.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) -> eyre::Result<()> {
        let worker = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        let Some(worker) = worker else {
            return Ok(());
        };

        let _ = self.sender.send(WriterCommand::Shutdown);
        worker
            .join()
            .map_err(|_| eyre!("Disk writer thread panicked"))
    }

    fn run<W: RecordWriter>(mut writer: W, mut receiver: UnboundedReceiver<WriterCommand>) {
        while let Some(command) = receiver.blocking_recv() {
            match command {
                WriterCommand::Write(record) => Self::write_record(&mut writer, &record),
                WriterCommand::Flush(reply) => {
                    let _ = reply.send(());
                }
                WriterCommand::Shutdown => break,
            }
        }

        if let Err(err) = writer.close() {
            tracing::warn!(target: DIAGNOSTIC_TARGET, "{:#}", err);
        }
        tracing::debug!(target: DIAGNOSTIC_TARGET, "disk writer stopped");
    }

    fn write_record<W: RecordWriter>(writer: &mut W, record: &LogRecord) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| writer.write(&record.message)));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) if is_io_error(&err) => {
                tracing::warn!(
                    target: DIAGNOSTIC_TARGET,
                    "dropped log record after I/O failure: {:#}",
                    err
                );
            }
            Ok(Err(err)) => {
                tracing::error!(
                    target: DIAGNOSTIC_TARGET,
                    "unexpected failure writing log record: {:#}",
                    err
                );
            }
            Err(_) => {
                let _ = writer.close();
                tracing::error!(
                    target: DIAGNOSTIC_TARGET,
                    "panic while writing log record, file state was reset"
                );
            }
        }
    }
}

impl LogSink for DiskLogWriter {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        let record = LogRecord::new(priority, tag, message);

        if self.sender.send(WriterCommand::Write(record)).is_err()
            && !self.drop_reported.swap(true, Ordering::Relaxed)
        {
            tracing::debug!(
                target: DIAGNOSTIC_TARGET,
                "disk writer is shut down, dropping records"
            );
        }
    }
}

impl Drop for DiskLogWriter {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(target: DIAGNOSTIC_TARGET, "{:#}", err);
        }
    }
}
