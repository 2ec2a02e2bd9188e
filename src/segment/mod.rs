//! Background removal capability.
//!
//! The pipeline does not know how foregrounds are segmented; it only needs
//! an injectable capability with a narrow contract: a lossless PNG goes in,
//! a PNG with a computed alpha channel isolating the subject comes out.
//! The capability may be absent, and its presence is queryable, so the HTTP
//! layer can reject removal requests up front.
//!
//! The shipped backend ([`CommandSegmenter`]) delegates to an external
//! process (e.g. a `rembg`-style tool) over stdin/stdout. Any model runtime
//! can sit behind that contract; no inference framework is assumed here.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::SegmentError;

/// A foreground segmentation backend.
///
/// Implementations receive a lossless-encoded PNG and return a new PNG
/// whose alpha channel isolates the foreground subject. Calls are blocking
/// and carry no internal retry; a failure is terminal for the request.
pub trait ForegroundSegmenter: Send + Sync {
    /// Compute an alpha-carrying image isolating the foreground.
    fn segment_foreground(&self, png: &[u8]) -> Result<Vec<u8>, SegmentError>;
}

// =============================================================================
// Command-backed Segmenter
// =============================================================================

/// Segmenter backed by an external command.
///
/// The command receives the source PNG on stdin and must write the
/// segmented PNG to stdout, exiting zero on success. This matches the CLI
/// contract of common removal tools (`rembg i - -`, `backgroundremover`,
/// or any wrapper script around a model runtime).
pub struct CommandSegmenter {
    program: String,
    args: Vec<String>,
}

impl CommandSegmenter {
    /// Build from a whitespace-separated command line, e.g. `"rembg i - -"`.
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?.to_string();
        let args = parts.map(str::to_string).collect();
        Some(Self { program, args })
    }

    /// The configured program name, for startup logging.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ForegroundSegmenter for CommandSegmenter {
    fn segment_foreground(&self, png: &[u8]) -> Result<Vec<u8>, SegmentError> {
        debug!(
            program = %self.program,
            input_bytes = png.len(),
            "Running segmentation command"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SegmentError::backend)?;

        // Feed stdin and drain stderr on separate threads; the child may
        // start writing output before it has consumed all input, and a
        // chatty backend can fill the stderr pipe buffer before it closes
        // stdout. Either pipe left unserviced would deadlock the child.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SegmentError::backend("failed to open child stdin"))?;
        let input = png.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SegmentError::backend("failed to open child stderr"))?;
        let stderr_reader = std::thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });

        let mut output = Vec::new();
        child
            .stdout
            .take()
            .ok_or_else(|| SegmentError::backend("failed to open child stdout"))?
            .read_to_end(&mut output)
            .map_err(SegmentError::backend)?;

        let status = child.wait().map_err(SegmentError::backend)?;
        writer
            .join()
            .map_err(|_| SegmentError::backend("stdin writer thread panicked"))?
            .map_err(SegmentError::backend)?;
        let stderr_text = stderr_reader
            .join()
            .unwrap_or_else(|_| String::from("<stderr reader thread panicked>"));

        if !status.success() {
            return Err(SegmentError::backend(format!(
                "command exited with {}: {}",
                status,
                stderr_text.trim()
            )));
        }
        if output.is_empty() {
            return Err(SegmentError::backend("command produced no output"));
        }

        Ok(output)
    }
}

// =============================================================================
// Tests
// =============================================================================
