//! File intake: drop-zone tracking and image validation.
//!
//! Everything here is pure state — no network, no filesystem. The
//! embedder normalizes its raw pointer events into [`DragEvent`]s
//! (suppressing default drag behavior at that boundary) and feeds them
//! to a [`DropZone`]; accepted files move on to the transfer layer.

mod dropzone;
mod selection;
mod validate;

pub use dropzone::{DragEvent, DragSignal, DropZone};
pub use selection::Selection;
pub use validate::{CandidateFile, FileRejection, ValidationResult, check_file, validate};

/// Maximum accepted file size: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Formats a byte count for display ("1.5 MB", "512 Bytes").
///
/// 1024-based units with up to two decimals, trailing zeros trimmed.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).log2() / 10.0).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / (1u64 << (exp * 10)) as f64;

    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[exp])
}
