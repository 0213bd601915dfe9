//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::{ImageFile, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited, 1 = direct children only)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: Some(1),
            extensions: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Lazily walk one directory. Every call starts a fresh walk.
    ///
    /// `source_index` is the position of `root` in the directory argument
    /// order and is carried on every yielded file.
    pub fn walk(&self, root: &Path, source_index: usize) -> ScanIter<'_> {
        if !root.is_dir() {
            return ScanIter {
                root: root.to_path_buf(),
                source_index,
                entries: None,
                pending: Some(ScanError::DirectoryNotFound {
                    path: root.to_path_buf(),
                }),
                filter: &self.filter,
                include_hidden: self.config.include_hidden,
            };
        }

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        ScanIter {
            root: root.to_path_buf(),
            source_index,
            entries: Some(walker.into_iter()),
            pending: None,
            filter: &self.filter,
            include_hidden: self.config.include_hidden,
        }
    }

    /// Scan all directories in order, collecting files and non-fatal errors.
    ///
    /// A file reachable from more than one root is only reported once, under
    /// the first root that reaches it.
    pub fn scan(&self, roots: &[PathBuf], events: &EventSender) -> ScanResult {
        events.send(Event::Scan(ScanEvent::Started {
            paths: roots.to_vec(),
        }));

        let mut images = Vec::new();
        let mut errors = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for (index, root) in roots.iter().enumerate() {
            debug!(directory = %root.display(), "scanning directory");

            for item in self.walk(root, index) {
                match item {
                    Ok(file) => {
                        if !seen.insert(file.path.clone()) {
                            continue;
                        }
                        events.send(Event::Scan(ScanEvent::ImageFound {
                            path: file.path.clone(),
                        }));
                        images.push(file);
                    }
                    Err(error) => {
                        warn!("{}", error);
                        events.send(Event::Scan(ScanEvent::Error {
                            path: error_path(&error).to_path_buf(),
                            message: error.to_string(),
                        }));
                        errors.push(error);
                    }
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_images: images.len(),
        }));

        ScanResult { images, errors }
    }
}

fn error_path(error: &ScanError) -> &Path {
    match error {
        ScanError::DirectoryNotFound { path }
        | ScanError::PermissionDenied { path }
        | ScanError::ReadDirectory { path, .. } => path,
    }
}

/// Lazy sequence of image candidates under one root
pub struct ScanIter<'a> {
    root: PathBuf,
    source_index: usize,
    entries: Option<walkdir::IntoIter>,
    pending: Option<ScanError>,
    filter: &'a ImageFilter,
    include_hidden: bool,
}

impl Iterator for ScanIter<'_> {
    type Item = Result<ImageFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }

        let entries = self.entries.as_mut()?;

        loop {
            let entry = match entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: e.into(),
                        }
                    };
                    return Some(Err(error));
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && !self.include_hidden && is_hidden(path) {
                    entries.skip_current_dir();
                }
                continue;
            }

            // Unfollowed symlinks and special files are never candidates
            if !entry.file_type().is_file() || !self.filter.should_include(path) {
                continue;
            }

            return Some(match entry.metadata() {
                Ok(metadata) => Ok(ImageFile {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                    source_index: self.source_index,
                    source_dir: self.root.clone(),
                }),
                Err(e) => Err(ScanError::ReadDirectory {
                    path: path.to_path_buf(),
                    source: e.into(),
                }),
            });
        }
    }
}
