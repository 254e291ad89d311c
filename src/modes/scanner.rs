use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::filter::parse_mode_file_name;
use super::template::{is_transfer_pipeline, TemplateRewriter};
use super::{Mode, ModeRegistry};

/// Installation tree for one build flavour: `<root>/<build>`
pub fn pipeline_root(root: &Path, build_type: &str) -> PathBuf {
    root.join(build_type)
}

/// Folder holding the mode files: `<root>/<build>/usr/share/apertium/modes`
pub fn modes_dir(root: &Path, build_type: &str) -> PathBuf {
    pipeline_root(root, build_type)
        .join("usr")
        .join("share")
        .join("apertium")
        .join("modes")
}

/// Scans a modes folder and rewrites what it finds for one installation
pub struct ModeScanner {
    modes_dir: PathBuf,
    rewriter: TemplateRewriter,
}

impl ModeScanner {
    /// Scanner for `<root>/<build>` using host path conventions
    pub fn new(root: &Path, build_type: &str) -> Self {
        Self {
            modes_dir: modes_dir(root, build_type),
            rewriter: TemplateRewriter::new(pipeline_root(root, build_type)),
        }
    }

    pub fn with_rewriter(modes_dir: PathBuf, rewriter: TemplateRewriter) -> Self {
        Self { modes_dir, rewriter }
    }

    pub fn modes_dir(&self) -> &Path {
        &self.modes_dir
    }

    /// Build a fresh registry.
    ///
    /// A missing folder gives an empty registry. Files that cannot be read
    /// are skipped; entries are visited in file name order and a later file
    /// replaces an earlier one with the same pair key.
    pub fn scan(&self) -> ModeRegistry {
        let mut registry = ModeRegistry::new();

        if !self.modes_dir.is_dir() {
            info!("Modes folder did not exist: {}", self.modes_dir.display());
            return registry;
        }

        let candidates = self.list_candidates();
        info!(
            "Found possible modes: {}",
            candidates
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("\t")
        );

        for (file_name, path) in candidates {
            // Comments in older pairs are not always UTF-8
            let template = match std::fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!("Failed to read mode file {}: {}", path.display(), e);
                    continue;
                }
            };

            if !is_transfer_pipeline(&template) {
                debug!("Skipping {}: no transfer stage", file_name);
                continue;
            }

            let Some((source, target)) = parse_mode_file_name(&file_name) else {
                continue;
            };

            let command_line = self.rewriter.rewrite(&template);
            let mode = Mode::new(source, target, command_line, file_name.clone());
            info!("Mode {}: {}", mode.pair_key, mode.command_line);

            if let Some(previous) = registry.insert(mode) {
                debug!("{} replaces {} for {}", file_name, previous.file_name, previous.pair_key);
            }
        }

        registry
    }

    fn list_candidates(&self) -> Vec<(String, PathBuf)> {
        WalkDir::new(&self.modes_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to list modes folder entry: {}", e);
                    None
                }
            })
            .filter_map(|entry| {
                let file_name = entry.file_name().to_str()?.to_string();
                parse_mode_file_name(&file_name)?;
                Some((file_name, entry.into_path()))
            })
            .collect()
    }
}
