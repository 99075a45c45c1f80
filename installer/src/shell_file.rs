//! Idempotent editing of `PATH` assignments in shell start-up files.
//!
//! A `PATH` assignment is a line consisting of optional leading whitespace,
//! the literal `PATH=`, and a `:`-separated list of segments. Lines such as
//! `export PATH=...` are deliberately left alone.
//!
//! Every edit normalises the file: runs of blank lines collapse to a single
//! blank line, leading and trailing newlines are trimmed, and exactly one
//! trailing newline is written. Applying the same edit twice is a no-op.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use thiserror::Error;

const ASSIGNMENT: &[u8] = b"PATH=";
const SEPARATOR: u8 = b':';
const INHERITED: &[u8] = b"$PATH";
const NEWLINE: u8 = b'\n';

/// Errors raised while rewriting a single shell file.
#[derive(Debug, Error)]
pub enum ShellFileError {
    /// The file could not be read.
    #[error("failed to read shell file {path}: {source}")]
    Read {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written back.
    #[error("failed to write shell file {path}: {source}")]
    Write {
        /// File that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ShellFileError {
    /// Returns the file the error refers to.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Whitespace accepted before `PATH=`. Lines are already split on `\n`.
fn is_leading_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\x0B' | b'\x0C' | b'\r')
}

/// A parsed `PATH=` assignment line.
///
/// Lines are handled as raw bytes so profiles in any encoding can be edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAssignment<'a> {
    prefix: &'a [u8],
    segments: Vec<&'a [u8]>,
}

impl<'a> PathAssignment<'a> {
    /// Parses `line` as a `PATH` assignment.
    ///
    /// # Examples
    ///
    /// ```
    /// use ddt_setup::shell_file::PathAssignment;
    ///
    /// let line = PathAssignment::parse(b"  PATH=$PATH:/opt/ddt/bin").expect("assignment");
    /// assert_eq!(line.prefix(), b"  ");
    /// assert_eq!(line.segments(), [b"$PATH".as_slice(), b"/opt/ddt/bin".as_slice()]);
    /// assert!(PathAssignment::parse(b"export PATH=$PATH:/opt/ddt/bin").is_none());
    /// ```
    #[must_use]
    pub fn parse(line: &'a [u8]) -> Option<Self> {
        let start = line
            .iter()
            .position(|byte| !is_leading_space(*byte))
            .unwrap_or(line.len());
        let (prefix, rest) = line.split_at(start);
        let value = rest.strip_prefix(ASSIGNMENT)?;
        Some(Self {
            prefix,
            segments: value.split(|byte| *byte == SEPARATOR).collect(),
        })
    }

    /// Leading whitespace before `PATH=`.
    #[must_use]
    pub fn prefix(&self) -> &'a [u8] {
        self.prefix
    }

    /// The `:`-separated segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[&'a [u8]] {
        &self.segments
    }

    /// Returns true if any segment equals `segment` exactly.
    #[must_use]
    pub fn contains(&self, segment: &[u8]) -> bool {
        self.segments.contains(&segment)
    }

    /// Drops every segment equal to `segment`.
    pub fn remove(&mut self, segment: &[u8]) {
        self.segments.retain(|existing| *existing != segment);
    }

    /// True when the only remaining segment is `$PATH`.
    #[must_use]
    pub fn only_inherits(&self) -> bool {
        self.segments == [INHERITED]
    }

    /// Renders the assignment back into a line.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.prefix.len() + ASSIGNMENT.len());
        line.extend_from_slice(self.prefix);
        line.extend_from_slice(ASSIGNMENT);
        line.extend_from_slice(&self.segments.join(&SEPARATOR));
        line
    }
}

fn trim_newlines(content: &[u8]) -> &[u8] {
    let start = content
        .iter()
        .position(|byte| *byte != NEWLINE)
        .unwrap_or(content.len());
    let end = content
        .iter()
        .rposition(|byte| *byte != NEWLINE)
        .map_or(start, |last| last + 1);
    content.get(start..end).unwrap_or_default()
}

fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content.split(|byte| *byte == NEWLINE)
}

/// Collapses blank-line runs, trims surrounding newlines, and terminates the
/// content with a single newline.
///
/// # Examples
///
/// ```
/// use ddt_setup::shell_file::normalise;
///
/// assert_eq!(normalise(b"\n\nalias ll='ls -l'\n\n\n\nPATH=$PATH:/bin\n\n"),
///     b"alias ll='ls -l'\n\nPATH=$PATH:/bin\n");
/// assert_eq!(normalise(b""), b"\n");
/// ```
#[must_use]
pub fn normalise(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 1);
    let mut pending = 0_usize;
    for &byte in trim_newlines(content) {
        if byte == NEWLINE {
            pending += 1;
            continue;
        }
        match pending {
            0 => {}
            1 => out.push(NEWLINE),
            _ => out.extend_from_slice(b"\n\n"),
        }
        pending = 0;
        out.push(byte);
    }
    out.push(NEWLINE);
    out
}

/// Appends `PATH=$PATH:<segment>` unless some assignment already lists the
/// segment, then normalises the result.
#[must_use]
pub fn add_to_content(content: &[u8], segment: &str) -> Vec<u8> {
    let needle = segment.as_bytes();
    let mut lines: Vec<Vec<u8>> = split_lines(content).map(<[u8]>::to_vec).collect();
    let present = lines
        .iter()
        .filter_map(|line| PathAssignment::parse(line))
        .any(|assignment| assignment.contains(needle));

    if present {
        debug!("segment '{segment}' is already on a PATH line");
    } else {
        let appended = PathAssignment {
            prefix: &[],
            segments: vec![INHERITED, needle],
        };
        lines.push(appended.render());
    }
    normalise(&lines.join(&NEWLINE))
}

/// Removes `segment` from every assignment, drops assignments left holding
/// only `$PATH`, then normalises the result.
#[must_use]
pub fn remove_from_content(content: &[u8], segment: &str) -> Vec<u8> {
    let needle = segment.as_bytes();
    let lines: Vec<Vec<u8>> = split_lines(content)
        .filter_map(|line| match PathAssignment::parse(line) {
            Some(mut assignment) => {
                assignment.remove(needle);
                (!assignment.only_inherits()).then(|| assignment.render())
            }
            None => Some(line.to_vec()),
        })
        .collect();
    normalise(&lines.join(&NEWLINE))
}

/// A proposed change to one shell file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellFileEdit {
    /// Bytes before the edit.
    pub original: Vec<u8>,
    /// Bytes after the edit.
    pub modified: Vec<u8>,
}

impl ShellFileEdit {
    /// True when applying the edit changes the file's bytes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.original != self.modified
    }
}

/// A shell start-up file loaded into memory.
#[derive(Debug, Clone)]
pub struct ShellFile {
    path: Utf8PathBuf,
    content: Vec<u8>,
}

impl ShellFile {
    /// Reads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellFileError::Read`] when the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self, ShellFileError> {
        let content = std::fs::read(path).map_err(|source| ShellFileError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
            content,
        })
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Current in-memory content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Proposes adding `segment` to the file's `PATH`.
    #[must_use]
    pub fn add_segment(&self, segment: &str) -> ShellFileEdit {
        self.edit(add_to_content(&self.content, segment))
    }

    /// Proposes removing `segment` from the file's `PATH`.
    #[must_use]
    pub fn remove_segment(&self, segment: &str) -> ShellFileEdit {
        self.edit(remove_from_content(&self.content, segment))
    }

    /// Writes `edit` back to disk. The file is rewritten even when the edit
    /// carries no changes.
    ///
    /// # Errors
    ///
    /// Returns [`ShellFileError::Write`] when the file cannot be written.
    pub fn apply_edit(&mut self, edit: &ShellFileEdit) -> Result<(), ShellFileError> {
        std::fs::write(&self.path, &edit.modified).map_err(|source| ShellFileError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.content.clone_from(&edit.modified);
        Ok(())
    }

    fn edit(&self, modified: Vec<u8>) -> ShellFileEdit {
        ShellFileEdit {
            original: self.content.clone(),
            modified,
        }
    }
}

/// Outcome for one file in a batch edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    /// File that was rewritten.
    pub path: Utf8PathBuf,
    /// Whether the file's bytes changed.
    pub changed: bool,
}

/// Outcome of a batch edit across several shell files.
#[derive(Debug, Default)]
pub struct EditReport {
    /// Files that were rewritten, in processing order.
    pub edits: Vec<FileEdit>,
    /// Files that could not be processed, in processing order.
    pub failures: Vec<ShellFileError>,
}

impl EditReport {
    /// True when every file was processed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files whose bytes changed.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.edits.iter().filter(|edit| edit.changed).count()
    }
}

/// Ensures every file in `files` has `segment` on its `PATH`.
///
/// Files are processed independently; a failure on one is recorded in the
/// report and the rest are still edited.
#[must_use]
pub fn add_segment(files: &[Utf8PathBuf], segment: &str) -> EditReport {
    process_files(files, |file| file.add_segment(segment))
}

/// Removes `segment` from the `PATH` assignments of every file in `files`.
///
/// Files are processed independently; a failure on one is recorded in the
/// report and the rest are still edited.
#[must_use]
pub fn remove_segment(files: &[Utf8PathBuf], segment: &str) -> EditReport {
    process_files(files, |file| file.remove_segment(segment))
}

fn process_files<F>(files: &[Utf8PathBuf], propose: F) -> EditReport
where
    F: Fn(&ShellFile) -> ShellFileEdit,
{
    let mut report = EditReport::default();
    for path in files {
        info!("processing file '{path}'");
        match process_file(path, &propose) {
            Ok(edit) => report.edits.push(edit),
            Err(e) => report.failures.push(e),
        }
    }
    report
}

fn process_file<F>(path: &Utf8Path, propose: &F) -> Result<FileEdit, ShellFileError>
where
    F: Fn(&ShellFile) -> ShellFileEdit,
{
    let mut file = ShellFile::load(path)?;
    let edit = propose(&file);
    file.apply_edit(&edit)?;
    Ok(FileEdit {
        path: path.to_owned(),
        changed: edit.has_changes(),
    })
}
