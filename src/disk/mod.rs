//! Asynchronous, size-rotated disk sink.
//!
//! All file I/O happens on one background thread. Callers only enqueue, so a
//! slow or broken filesystem stalls log throughput but never the caller.

mod rotation;
mod writer;

pub use rotation::{
    list_log_files, log_file_path, LogFileInfo, RotatingFileManager, FILE_EXTENSION, FILE_PREFIX,
};
pub use writer::DiskLogWriter;

fn is_io_error(err: &eyre::Report) -> bool {
    err.chain().any(|cause| cause.is::<std::io::Error>())
}
