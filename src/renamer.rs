//! Renaming images so filename order follows their sorted order.
//!
//! Each image receives the first generated name that does not already exist
//! in the directory. A failed rename never stops the batch and completed
//! renames are never rolled back; every image gets an outcome in the
//! returned [`RenameReport`].
//!
//! The existence check and the rename are two separate calls. A file
//! created by another process in between can still be overwritten.

use crate::generator::NameGenerator;
use crate::image_info::ImageDescriptor;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The file was renamed.
    Renamed { from: String, to: String },
    /// Dry run: the file would have been renamed.
    Planned { from: String, to: String },
    /// The file kept its name.
    Failed { file: String, reason: String },
}

/// Outcomes of a rename batch, in input order.
#[derive(Debug, Default)]
pub struct RenameReport {
    pub outcomes: Vec<RenameOutcome>,
}

impl RenameReport {
    /// Number of files renamed (or planned, for a dry run).
    pub fn renamed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, RenameOutcome::Failed { .. }))
            .count()
    }

    /// The failed files with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            RenameOutcome::Failed { file, reason } => Some((file.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Returns true if no image failed.
    pub fn is_complete_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Applies a [`NameGenerator`] to a sequence of images in one directory.
///
/// The engine owns its generator and is consumed by
/// [`RenameEngine::rename_images`], so a counter is never shared between
/// two batches.
pub struct RenameEngine {
    base_path: PathBuf,
    generator: NameGenerator,
    dry_run: bool,
}

impl RenameEngine {
    pub fn new(base_path: &Path, generator: NameGenerator) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            generator,
            dry_run: false,
        }
    }

    /// When set, names are planned but nothing on disk changes. Planned
    /// names count as taken so the plan matches a real run.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Renames every image in order and updates its descriptor.
    ///
    /// Dry runs leave the descriptors untouched.
    pub fn rename_images(mut self, images: &mut [ImageDescriptor]) -> RenameReport {
        let mut report = RenameReport::default();
        let mut planned: HashSet<String> = HashSet::new();

        for image in images.iter_mut() {
            let base_path = &self.base_path;
            let next_name = self.generator.next_free_name(image, |candidate| {
                planned.contains(candidate) || base_path.join(candidate).symlink_metadata().is_ok()
            });

            let Some(new_name) = next_name else {
                log::warn!("Name counter exhausted before {}", image.file_name);
                report.outcomes.push(RenameOutcome::Failed {
                    file: image.file_name.clone(),
                    reason: "no unused name left".to_string(),
                });
                continue;
            };

            if self.dry_run {
                planned.insert(new_name.clone());
                report.outcomes.push(RenameOutcome::Planned {
                    from: image.file_name.clone(),
                    to: new_name,
                });
                continue;
            }

            report.outcomes.push(self.rename_one(image, new_name));
        }

        report
    }

    fn rename_one(&self, image: &mut ImageDescriptor, new_name: String) -> RenameOutcome {
        let from = self.base_path.join(&image.file_name);
        let to = self.base_path.join(&new_name);
        match fs::rename(&from, &to) {
            Ok(()) => {
                log::debug!("Renamed {} -> {}", image.file_name, new_name);
                let old_name = std::mem::replace(&mut image.file_name, new_name.clone());
                if image.original_name.is_none() {
                    image.original_name = Some(old_name.clone());
                }
                RenameOutcome::Renamed {
                    from: old_name,
                    to: new_name,
                }
            }
            Err(e) => {
                log::warn!("Could not rename {}: {}", image.file_name, e);
                RenameOutcome::Failed {
                    file: image.file_name.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Renames `images` inside `base_path` with base-36 names counting from
/// `start` by `step`.
pub fn rename_images(
    base_path: &Path,
    images: &mut [ImageDescriptor],
    start: u64,
    step: i64,
) -> RenameReport {
    RenameEngine::new(base_path, NameGenerator::new(start, step)).rename_images(images)
}
