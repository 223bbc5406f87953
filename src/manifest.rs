//! # View Manifest Model
//!
//! A view manifest (`view.txt`) declares a directory tree made of independently
//! versioned repositories. Each significant line binds one directory to a
//! repository:
//!
//! ```text
//! # directory   url                 vcs  branch  revision
//! libs/foo      git://host/foo.git  GIT  master  HEAD
//! tools         git://host/tools    GIT  stable  7783ac32d05162f328bba0d64e56b80a9f15bb17
//! ```
//!
//! Fields are separated by runs of whitespace. Blank lines and lines whose
//! first non-whitespace character is `#` are ignored. Every other line must
//! have exactly five fields. A revision of `HEAD` means "track the tip of the
//! branch"; anything else is a pinned commit id.
//!
//! Serialization writes one space-separated line per entry in sequence order,
//! so `parse(serialize(m))` reproduces `m` exactly. Comments and blank lines
//! of hand-written input are not preserved.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default file name of a view manifest.
pub const DEFAULT_FILENAME: &str = "view.txt";

/// Revision sentinel meaning "track the branch's current tip".
pub const TRACK_TIP: &str = "HEAD";

/// VCS tag for git repositories, the only kind currently supported.
pub const VCS_GIT: &str = "GIT";

const FIELD_COUNT: usize = 5;

/// One row of a view manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    /// Directory (relative to the view root) the repository is checked out in.
    pub directory: String,
    /// Location of the remote repository.
    pub url: String,
    /// Version control system tag, e.g. `GIT`.
    pub vcs: String,
    /// Branch tracked by the entry.
    pub branch: String,
    /// Pinned commit id, or [`TRACK_TIP`].
    pub revision: String,
}

impl ManifestEntry {
    pub fn new(
        directory: impl Into<String>,
        url: impl Into<String>,
        vcs: impl Into<String>,
        branch: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            url: url.into(),
            vcs: vcs.into(),
            branch: branch.into(),
            revision: revision.into(),
        }
    }

    /// Whether the entry names a concrete revision rather than the branch tip.
    pub fn has_pinned_revision(&self) -> bool {
        self.revision != TRACK_TIP
    }

    /// Whether both entries follow the same branch of the same repository.
    pub fn same_branch(&self, other: &ManifestEntry) -> bool {
        self.vcs == other.vcs && self.url == other.url && self.branch == other.branch
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.directory, self.url, self.vcs, self.branch, self.revision
        )
    }
}

/// An ordered list of manifest entries.
///
/// Entry order follows the source text and is kept when serializing, but it
/// does not take part in equality: two manifests are equal when they bind the
/// same directories to structurally equal entries.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ManifestEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Read and parse a manifest file. The path is used as the source name in
    /// parse errors.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        parse(&text, &path.display().to_string())
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by directory. A later duplicate wins.
    pub fn get(&self, directory: &str) -> Option<&ManifestEntry> {
        self.entries.iter().rev().find(|e| e.directory == directory)
    }

    /// Directory-keyed lookup of all entries, later duplicates winning.
    pub fn by_directory(&self) -> BTreeMap<&str, &ManifestEntry> {
        self.entries
            .iter()
            .map(|entry| (entry.directory.as_str(), entry))
            .collect()
    }

    /// Render the manifest in its line-oriented text form.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Write the serialized manifest to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.serialize().as_bytes())?;
        Ok(())
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.by_directory() == other.by_directory()
    }
}

impl Eq for Manifest {}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s, "<string>")
    }
}

fn is_insignificant(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse manifest text.
///
/// `source_name` identifies the text (usually a file name) in error messages.
///
/// # Errors
///
/// Returns [`Error::Parse`] for the first significant line that does not
/// split into exactly five whitespace-separated fields.
pub fn parse(text: &str, source_name: &str) -> Result<Manifest> {
    let mut manifest = Manifest::new();
    for (index, line) in text.lines().enumerate() {
        if is_insignificant(line) {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(Error::Parse {
                source_name: source_name.to_string(),
                line: index + 1,
                message: format!(
                    "expected {} fields, found {}",
                    FIELD_COUNT,
                    fields.len()
                ),
            });
        }
        manifest.push(ManifestEntry::new(
            fields[0], fields[1], fields[2], fields[3], fields[4],
        ));
    }
    Ok(manifest)
}

/// Parse manifest bytes, e.g. a file read out of a git object.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the first line that is not valid UTF-8,
/// or any error [`parse`] reports.
pub fn parse_bytes(bytes: &[u8], source_name: &str) -> Result<Manifest> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        Error::Parse {
            source_name: source_name.to_string(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            message: "invalid UTF-8".to_string(),
        }
    })?;
    parse(text, source_name)
}

#[cfg(test)]
pub(crate) fn simple_entry(name: &str, branch: &str, revision: &str) -> ManifestEntry {
    ManifestEntry::new(
        name,
        format!("git://{0}/{0}", name),
        VCS_GIT,
        branch,
        revision,
    )
}
