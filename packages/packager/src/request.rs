use std::collections::{BTreeSet, HashSet};

use crate::error::{PackageError, Result};

/// The delta between an archive and the one rebuilt from it.
///
/// Every added path is implicitly removed from the carried-over members, so
/// replacing a file never leaves two entries with the same name. Adding a path
/// twice keeps only the last content.
#[derive(Clone, Debug, Default)]
pub struct MutationRequest {
    deletes: BTreeSet<String>,
    binary: Vec<(String, Vec<u8>)>,
    text: Vec<(String, String)>,
}

impl MutationRequest {
    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.deletes.insert(path.into());
        self
    }

    pub fn add_binary(
        &mut self,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> &mut Self {
        let path = path.into();
        self.forget(&path);
        self.binary.push((path, content.into()));
        self
    }

    /// Add a text member, stored UTF-8 encoded.
    pub fn add_text(&mut self, path: impl Into<String>, text: impl Into<String>) -> &mut Self {
        let path = path.into();
        self.forget(&path);
        self.text.push((path, text.into()));
        self
    }

    fn forget(&mut self, path: &str) {
        self.binary.retain(|(p, _)| p != path);
        self.text.retain(|(p, _)| p != path);
    }

    pub fn deletes(&self) -> impl Iterator<Item = &str> {
        self.deletes.iter().map(String::as_str)
    }

    pub fn binary_entries(&self) -> &[(String, Vec<u8>)] {
        &self.binary
    }

    pub fn text_entries(&self) -> &[(String, String)] {
        &self.text
    }

    /// Paths that must not be copied from the source archive.
    pub fn exclusions(&self) -> HashSet<&str> {
        self.deletes
            .iter()
            .map(String::as_str)
            .chain(self.added_paths())
            .collect()
    }

    pub fn added_paths(&self) -> impl Iterator<Item = &str> {
        self.binary
            .iter()
            .map(|(p, _)| p.as_str())
            .chain(self.text.iter().map(|(p, _)| p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.binary.is_empty() && self.text.is_empty()
    }

    /// Check every added path before anything is written.
    pub fn validate(&self) -> Result<()> {
        self.added_paths().try_for_each(validate_member_path)
    }
}

/// A member path must be relative, `/`-separated and free of empty, `.` and
/// `..` components.
pub fn validate_member_path(path: &str) -> Result<()> {
    let valid = !path.is_empty()
        && !path.contains(['\\', '\0'])
        && path
            .split('/')
            .all(|c| !c.is_empty() && c != "." && c != "..");
    if valid {
        Ok(())
    } else {
        Err(PackageError::InvalidMemberPath(path.to_string()))
    }
}
