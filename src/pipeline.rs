//! Sink assembly
//!
//! Turns an [`Options`] snapshot into the cores and sinks a function table is
//! built from. Nothing here touches the installed state, so a failed assembly
//! leaves the running pipeline alone.

use crate::core::encoder::Encoder;
use crate::core::error::{LoggerError, Result};
use crate::core::log_core::{LevelGate, LogCore};
use crate::core::logger::Logger;
use crate::core::options::Options;
use crate::sinks::{self, MultiSink, RotatingFileSink, Sink, StderrSink, StdoutSink, STDERR_PATH};
use std::sync::Arc;

/// Everything one configuration produced.
pub struct Pipeline {
    /// Accepts every level; used for logger writes and the fatal exit check
    pub always_on: LogCore,
    /// Follows the logger's current output level; used by the facade bridges
    pub conditional: LogCore,
    pub error_sink: Arc<dyn Sink>,
    /// Output sinks released by `close`
    pub outputs: Vec<Arc<dyn Sink>>,
}

impl Pipeline {
    /// Console lines on stdout, diagnostics on stderr.
    pub fn stdio(logger: Arc<Logger>) -> Self {
        let sink: Arc<dyn Sink> = Arc::new(StdoutSink);
        Self::from_parts(
            Encoder::Console,
            sink.clone(),
            logger,
            Arc::new(StderrSink),
            vec![sink],
        )
    }

    fn from_parts(
        encoder: Encoder,
        sink: Arc<dyn Sink>,
        logger: Arc<Logger>,
        error_sink: Arc<dyn Sink>,
        outputs: Vec<Arc<dyn Sink>>,
    ) -> Self {
        Self {
            always_on: LogCore::new(encoder, sink.clone(), LevelGate::Always),
            conditional: LogCore::new(encoder, sink, LevelGate::Logger(logger)),
            error_sink,
            outputs,
        }
    }
}

/// Open every sink named by `options` and wire the two cores.
///
/// The primary output and the rotating output receive the same lines when
/// both are set. An empty `error_output_path` selects stderr.
///
/// # Errors
///
/// - [`LoggerError::SinkOpen`] when an output or the error output cannot be
///   opened. Sinks opened before the failure are closed first.
/// - [`LoggerError::InvalidConfiguration`] when no output is named at all.
pub fn build_pipeline(options: &Options, logger: Arc<Logger>) -> Result<Pipeline> {
    let encoder = Encoder::new(options.json_encoding);
    let mut outputs: Vec<Arc<dyn Sink>> = Vec::with_capacity(2);

    if !options.output_path.is_empty() {
        outputs.push(sinks::open(&options.output_path)?);
    }

    if !options.rotate_output_path.is_empty() {
        match RotatingFileSink::with_policy(&options.rotate_output_path, options.rotation_policy()) {
            Ok(sink) => outputs.push(Arc::new(sink)),
            Err(err) => {
                close_all(&outputs);
                return Err(err);
            }
        }
    }

    if outputs.is_empty() {
        return Err(LoggerError::config(
            "pipeline",
            "neither an output path nor a rotating output path is set",
        ));
    }

    let error_path = if options.error_output_path.is_empty() {
        STDERR_PATH
    } else {
        options.error_output_path.as_str()
    };
    let error_sink = match sinks::open(error_path) {
        Ok(sink) => sink,
        Err(err) => {
            close_all(&outputs);
            return Err(err);
        }
    };

    let sink: Arc<dyn Sink> = match outputs.as_slice() {
        [only] => only.clone(),
        _ => Arc::new(MultiSink::new(outputs.clone())),
    };

    Ok(Pipeline::from_parts(encoder, sink, logger, error_sink, outputs))
}

fn close_all(sinks: &[Arc<dyn Sink>]) {
    for sink in sinks {
        let _ = sink.close();
    }
}
