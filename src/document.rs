use crate::error::FlowError;
use crate::generator::TextEdit;
use crate::position::LineIndex;
use std::path::{Path, PathBuf};

/// An in-memory source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    path: PathBuf,
    text: String,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name used in source ranges.
    pub fn file_name(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Applies all edits or none of them.
    ///
    /// Edits are positioned against the current text, must lie inside it and must not
    /// overlap. Insertions at the same position keep their order.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) -> Result<(), FlowError> {
        self.text = self.edited(edits)?;
        Ok(())
    }

    /// A copy of the document with the edits applied.
    pub fn with_edits(&self, edits: &[TextEdit]) -> Result<TextDocument, FlowError> {
        Ok(Self {
            path: self.path.clone(),
            text: self.edited(edits)?,
        })
    }

    fn edited(&self, edits: &[TextEdit]) -> Result<String, FlowError> {
        let index = LineIndex::new(&self.text);
        let mut resolved = Vec::with_capacity(edits.len());
        for (order, edit) in edits.iter().enumerate() {
            let start = index
                .offset_of(&self.text, edit.range.start)
                .ok_or_else(|| out_of_bounds(edit))?;
            let end = index
                .offset_of(&self.text, edit.range.end)
                .ok_or_else(|| out_of_bounds(edit))?;
            if end < start {
                return Err(FlowError::InvalidEdit(format!(
                    "edit ends at {} before it starts at {}",
                    edit.range.end, edit.range.start
                )));
            }
            resolved.push((start, end, order, edit.new_text.as_str()));
        }

        resolved.sort_by_key(|&(start, end, order, _)| (start, end, order));
        for pair in resolved.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if previous.1 > next.0 {
                return Err(FlowError::InvalidEdit(format!(
                    "edits {} and {} overlap",
                    previous.2, next.2
                )));
            }
        }

        let mut text = self.text.clone();
        for &(start, end, _, new_text) in resolved.iter().rev() {
            text.replace_range(start..end, new_text);
        }
        Ok(text)
    }
}

fn out_of_bounds(edit: &TextEdit) -> FlowError {
    FlowError::InvalidEdit(format!(
        "range {}-{} lies outside the document",
        edit.range.start, edit.range.end
    ))
}
