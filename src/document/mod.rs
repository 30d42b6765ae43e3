//! Loading contract documents.
//!
//! Documents are plain UTF-8 text read from files or stdin. Size and
//! emptiness checks happen here, before any model call is made.

use crate::models::ContractDocument;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name used for a document read from stdin.
pub const STDIN_NAME: &str = "<stdin>";

/// Load every input. An empty list or `-` means stdin.
pub fn load_documents(inputs: &[PathBuf], max_bytes: usize) -> Result<Vec<ContractDocument>> {
    if inputs.is_empty() {
        return Ok(vec![load_reader(std::io::stdin().lock(), STDIN_NAME, max_bytes)?]);
    }

    let mut stdin_used = false;
    let mut documents = Vec::with_capacity(inputs.len());

    for input in inputs {
        if input.as_os_str() == "-" {
            if stdin_used {
                bail!("stdin ('-') can only be given once");
            }
            stdin_used = true;
            documents.push(load_reader(std::io::stdin().lock(), STDIN_NAME, max_bytes)?);
        } else {
            documents.push(load_file(input, max_bytes)?);
        }
    }

    info!("Loaded {} document(s)", documents.len());
    Ok(documents)
}

/// Load a single contract file.
pub fn load_file(path: &Path, max_bytes: usize) -> Result<ContractDocument> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Cannot access document: {}", path.display()))?;

    if !metadata.is_file() {
        bail!("Not a file: {}", path.display());
    }
    if metadata.len() > max_bytes as u64 {
        bail!(
            "Document {} is {} bytes, larger than the {} byte limit",
            path.display(),
            metadata.len(),
            max_bytes
        );
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} as UTF-8 text", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} ({} bytes)", name, text.len());
    finish(name, text)
}

/// Load a document from any reader, enforcing the size limit.
pub fn load_reader<R: Read>(reader: R, name: &str, max_bytes: usize) -> Result<ContractDocument> {
    let mut buffer = Vec::new();
    reader
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut buffer)
        .with_context(|| format!("Failed to read {}", name))?;

    if buffer.len() > max_bytes {
        bail!("Document {} is larger than the {} byte limit", name, max_bytes);
    }

    let text = String::from_utf8(buffer).with_context(|| format!("{} is not valid UTF-8 text", name))?;
    finish(name.to_string(), text)
}

fn finish(name: String, text: String) -> Result<ContractDocument> {
    if text.trim().is_empty() {
        bail!("Document {} is empty", name);
    }
    Ok(ContractDocument::new(name, text))
}

/// File stem used to name per-document reports.
pub fn report_stem(document: &ContractDocument) -> String {
    if document.name == STDIN_NAME {
        return "stdin".to_string();
    }

    let stem = Path::new(&document.name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}
