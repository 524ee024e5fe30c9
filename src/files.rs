//! Where file names come from and where user facing messages go.
//!
//! The [`SoftBodySystem`][crate::SoftBodySystem] never decides on paths
//! itself. Commands that carry no path ask a [`SoftFileInterface`], which in
//! an interactive application opens a file dialog. Every answer may be
//! `None` (dialog cancelled), which aborts the command.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use tracing::info;


/// File dialogs and the message sink of the application.
pub trait SoftFileInterface {
    /// Resolves the name of a data file (e.g. a texture) referenced by a
    /// model. `for_read` is `true` if the file is about to be opened for
    /// reading.
    fn soft_file_name(&mut self, name: &str, for_read: bool) -> Option<PathBuf>;

    /// Asks for a file to write. `extension` is without leading dot.
    fn save_file_name(&mut self, extension: &str, description: &str) -> Option<PathBuf>;

    /// Asks for a file to read. `extension` is without leading dot.
    fn load_file_name(&mut self, extension: &str, description: &str) -> Option<PathBuf>;

    /// Shows a message to the user.
    fn message_report(&mut self, msg: &str);
}

/// A non-interactive [`SoftFileInterface`] rooted in a directory.
///
/// Paths for load and save requests are taken from queues filled in advance
/// (relative paths are resolved against the root); an empty queue answers
/// `None`. Messages are logged and kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFiles {
    root: PathBuf,
    loads: VecDeque<PathBuf>,
    saves: VecDeque<PathBuf>,
    messages: Vec<String>,
}

impl DirectoryFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            .. Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answers the next load request with `path`.
    pub fn queue_load(&mut self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.loads.push_back(path);
    }

    /// Answers the next save request with `path`.
    pub fn queue_save(&mut self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.saves.push_back(path);
    }

    /// All messages reported so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::replace(&mut self.messages, Vec::new())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl SoftFileInterface for DirectoryFiles {
    fn soft_file_name(&mut self, name: &str, for_read: bool) -> Option<PathBuf> {
        let path = self.resolve(Path::new(name));
        if for_read && !path.is_file() {
            return None;
        }
        Some(path)
    }

    fn save_file_name(&mut self, extension: &str, description: &str) -> Option<PathBuf> {
        let out = self.saves.pop_front();
        if out.is_none() {
            info!("no {} file (*.{}) to save to", description, extension);
        }
        out
    }

    fn load_file_name(&mut self, extension: &str, description: &str) -> Option<PathBuf> {
        let out = self.loads.pop_front();
        if out.is_none() {
            info!("no {} file (*.{}) to load", description, extension);
        }
        out
    }

    fn message_report(&mut self, msg: &str) {
        info!("{}", msg);
        self.messages.push(msg.to_owned());
    }
}
