//! Conversion pipeline
//!
//! Runs Collect → Render → Assemble → Write for one `ConversionRequest`.
//! Per-image failures are logged and counted without stopping the batch;
//! only "nothing rendered", "cannot write" and cancellation end a run early.
//!
//! Progress and log lines are reported as `ConversionEvent`s. Call
//! [`run_conversion`] to run on the current thread, or [`spawn_conversion`]
//! to run on a worker thread and receive events over a channel.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::output::{write_atomically, OutputTarget};
use crate::pdf::{assemble_with_progress, AssembleOptions};
use crate::render::{ImageRenderer, SourceImage};
use crate::settings::GridConfig;

/// Everything a front end supplies for one run
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Input images, in placement order
    pub inputs: Vec<PathBuf>,
    pub config: GridConfig,
    pub output: OutputTarget,
}

/// Stage of a conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPhase {
    Idle,
    CollectingInputs,
    Rendering,
    Assembling,
    Writing,
    Done,
    /// Written, but some images were skipped
    DoneWithErrors,
    Failed,
}

impl ConversionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConversionPhase::Done | ConversionPhase::DoneWithErrors | ConversionPhase::Failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Updates sent from the pipeline to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionEvent {
    Phase(ConversionPhase),
    /// Sent after each image, successful or not (1-based `current`)
    Progress { current: usize, total: usize },
    Log(LogLine),
}

impl ConversionEvent {
    /// Completion percentage for `Progress` events
    pub fn percent(&self) -> Option<u8> {
        match *self {
            ConversionEvent::Progress { current, total } if total > 0 => {
                Some((current.min(total) * 100 / total) as u8)
            }
            ConversionEvent::Progress { .. } => Some(100),
            _ => None,
        }
    }
}

/// An input that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a run that produced a document
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub output_path: PathBuf,
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedImage>,
    pub page_count: usize,
}

impl ConversionSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} succeeded, {} failed; {} pages written to {}",
            self.total,
            self.succeeded,
            self.failed.len(),
            self.page_count,
            self.output_path.display()
        )
    }
}

/// Forwards pipeline messages to both the `log` facade and the event callback
struct Reporter<'a, F: FnMut(ConversionEvent)> {
    emit: &'a mut F,
}

impl<F: FnMut(ConversionEvent)> Reporter<'_, F> {
    fn phase(&mut self, phase: ConversionPhase) {
        log::debug!("Phase: {:?}", phase);
        (self.emit)(ConversionEvent::Phase(phase));
    }

    fn progress(&mut self, current: usize, total: usize) {
        (self.emit)(ConversionEvent::Progress { current, total });
    }

    fn log(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Warn => log::warn!("{}", message),
            LogLevel::Error => log::error!("{}", message),
        }
        (self.emit)(ConversionEvent::Log(LogLine { level, message }));
    }

    fn info(&mut self, message: String) {
        self.log(LogLevel::Info, message);
    }

    fn error(&mut self, message: String) {
        self.log(LogLevel::Error, message);
    }
}

/// Run a conversion on the calling thread.
///
/// `emit` receives every event in order. `cancel` is checked before each
/// image; once set the run stops with `Error::Cancelled` and writes nothing.
pub fn run_conversion<F: FnMut(ConversionEvent)>(
    request: &ConversionRequest,
    emit: &mut F,
    cancel: &AtomicBool,
) -> Result<ConversionSummary> {
    let mut reporter = Reporter { emit };
    let result = run_phases(request, &mut reporter, cancel);

    match &result {
        Ok(summary) => {
            reporter.info(format!("Finished: {}", summary));
            for failure in &summary.failed {
                reporter.log(
                    LogLevel::Warn,
                    format!("  failed: {} ({})", failure.path.display(), failure.reason),
                );
            }
            reporter.phase(if summary.has_errors() {
                ConversionPhase::DoneWithErrors
            } else {
                ConversionPhase::Done
            });
        }
        Err(e) => {
            reporter.error(format!("Conversion failed: {}", e));
            reporter.phase(ConversionPhase::Failed);
        }
    }

    result
}

/// Run a conversion without events or cancellation
pub fn convert(request: &ConversionRequest) -> Result<ConversionSummary> {
    run_conversion(request, &mut |_| {}, &AtomicBool::new(false))
}

fn run_phases<F: FnMut(ConversionEvent)>(
    request: &ConversionRequest,
    reporter: &mut Reporter<'_, F>,
    cancel: &AtomicBool,
) -> Result<ConversionSummary> {
    let config = &request.config;
    let total = request.inputs.len();

    reporter.phase(ConversionPhase::CollectingInputs);
    reporter.info(format!(
        "Starting conversion of {} images ({} per page, {}, {} quality)",
        total,
        config.images_per_page(),
        config.page_size(),
        if config.high_quality() { "high" } else { "standard" }
    ));
    if total == 0 {
        return Err(Error::NoValidImages { total: 0, failed: 0 });
    }

    let grid = config.grid_layout();
    let mut renderer = ImageRenderer::new(config.high_quality());

    reporter.phase(ConversionPhase::Rendering);
    let mut units = Vec::with_capacity(total);
    let mut failed = Vec::new();

    for (index, path) in request.inputs.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled {
                processed: index,
                total,
            });
        }

        let source = SourceImage::new(path.clone());
        match renderer.render(&source, grid.cell_size()) {
            Ok(unit) => {
                reporter.info(format!(
                    "Processed {} (scale {:.2}x)",
                    source.display_name(),
                    unit.scale
                ));
                units.push(unit);
            }
            Err(e) if e.is_per_image() => {
                reporter.error(format!("Skipped {}: {}", source.display_name(), e));
                failed.push(FailedImage {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        reporter.progress(index + 1, total);
    }

    if units.is_empty() {
        return Err(Error::NoValidImages {
            total,
            failed: failed.len(),
        });
    }

    reporter.phase(ConversionPhase::Assembling);
    let pages = grid.pages(units.len());
    let options = AssembleOptions {
        page_size: config.page_size(),
        compress_all: renderer.profile().compress_all,
        title: Some(request.output.base_name.clone()),
    };
    let bytes = assemble_with_progress(&pages, units, &options, |page, page_count| {
        reporter.info(format!("Processing page {} of {}", page, page_count));
    })?;

    reporter.phase(ConversionPhase::Writing);
    let output_path = request.output.resolve();
    reporter.info(format!("Output file: {}", output_path.display()));
    write_atomically(&output_path, &bytes).map_err(|source| Error::OutputWrite {
        path: output_path.clone(),
        failed: failed.len(),
        source,
    })?;

    Ok(ConversionSummary {
        output_path,
        total,
        succeeded: total - failed.len(),
        failed,
        page_count: pages.len(),
    })
}

/// A conversion running on a background worker thread
pub struct ConversionHandle {
    events: mpsc::UnboundedReceiver<ConversionEvent>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<Result<ConversionSummary>>,
}

impl ConversionHandle {
    /// Ask the worker to stop before its next image
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Shared cancellation flag, e.g. for a signal handler
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Event receiver for async consumers
    pub fn events(&mut self) -> &mut mpsc::UnboundedReceiver<ConversionEvent> {
        &mut self.events
    }

    /// Block until the next event; `None` once the worker has finished.
    ///
    /// Must not be called from inside an async runtime.
    pub fn next_event_blocking(&mut self) -> Option<ConversionEvent> {
        self.events.blocking_recv()
    }

    /// Wait for the worker and return its result
    pub fn join(self) -> Result<ConversionSummary> {
        self.worker.join().unwrap_or(Err(Error::WorkerPanicked))
    }
}

/// Start a conversion on a dedicated worker thread
pub fn spawn_conversion(request: ConversionRequest) -> Result<ConversionHandle> {
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let worker = std::thread::Builder::new()
        .name("svg-grid-worker".to_string())
        .spawn(move || {
            // Receiver may be gone if the front end stopped listening
            let mut emit = |event: ConversionEvent| {
                let _ = update_tx.send(event);
            };
            run_conversion(&request, &mut emit, &worker_cancel)
        })?;

    Ok(ConversionHandle {
        events: update_rx,
        cancel,
        worker,
    })
}
