//! Corpus file loading.
//!
//! A corpus is a plain-text file of paragraphs separated by newlines.
//! Retrieval granularity is exactly these paragraphs: they are embedded
//! individually and returned individually.

use std::path::Path;

use deskhand_core::error::CorpusError;

/// Load the paragraphs of a corpus file.
///
/// Each non-blank line is one paragraph; surrounding whitespace is
/// stripped. A file with no usable paragraphs is an error, because an
/// agent with an empty corpus could never answer anything.
pub fn load_paragraphs(agent: &str, path: &Path) -> Result<Vec<String>, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let paragraphs: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if paragraphs.is_empty() {
        return Err(CorpusError::EmptyCorpus {
            agent: agent.to_string(),
        });
    }

    Ok(paragraphs)
}
