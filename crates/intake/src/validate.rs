use crate::MAX_FILE_SIZE;

/// A selected or dropped file awaiting validation.
///
/// Exists only between selection and either rejection or handoff to a
/// transfer; the transfer takes ownership of the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// MIME-like type tag, e.g. `image/png`.
    pub content_type: String,
    pub data: Vec<u8>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Why a single file was rejected.
///
/// The `Display` strings are exactly what the UI renders in its error
/// list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("\"{name}\" is not an image file")]
    NotAnImage { name: String },

    #[error("\"{name}\" is too large (max 10MB)")]
    TooLarge { name: String },

    #[error("\"{name}\" is empty")]
    Empty { name: String },
}

/// Outcome of validating one selection or drop.
///
/// Produced fresh per event and never mutated afterwards. `accepted`
/// keeps the input order; `valid` is true iff no file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub accepted: Vec<CandidateFile>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub(crate) fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            accepted: Vec::new(),
            errors: vec![error.into()],
        }
    }
}

/// Checks one file against the acceptance rules.
///
/// Rules apply in order — image type, size bound, non-empty — and the
/// first failure wins, so a file yields at most one rejection.
pub fn check_file(file: &CandidateFile) -> Result<(), FileRejection> {
    if !file.is_image() {
        return Err(FileRejection::NotAnImage {
            name: file.name.clone(),
        });
    }

    if file.size() > MAX_FILE_SIZE {
        return Err(FileRejection::TooLarge {
            name: file.name.clone(),
        });
    }

    if file.size() == 0 {
        return Err(FileRejection::Empty {
            name: file.name.clone(),
        });
    }

    Ok(())
}

/// Validates a selection, splitting it into accepted files and per-file
/// error strings.
///
/// Partial acceptance: files that pass are returned even when siblings
/// fail, so the caller decides whether to proceed with a partial batch.
pub fn validate(files: Vec<CandidateFile>) -> ValidationResult {
    if files.is_empty() {
        return ValidationResult::rejected("No files selected");
    }

    let mut accepted = Vec::with_capacity(files.len());
    let mut errors = Vec::new();

    for file in files {
        match check_file(&file) {
            Ok(()) => accepted.push(file),
            Err(rejection) => {
                tracing::debug!(file = %file.name, reason = %rejection, "file rejected");
                errors.push(rejection.to_string());
            }
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        accepted,
        errors,
    }
}
