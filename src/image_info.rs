//! Image discovery: directory listing, content sniffing, decoding and
//! average color.
//!
//! Anything that is not a decodable image is skipped, never reported as an
//! error. Only an unreadable directory is fatal.

use crate::config::CompiledFilters;
use image::ImageFormat;
use image::io::Reader as ImageReader;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Bytes read from the start of a file to sniff its type.
const SNIFF_LEN: u64 = 8 * 1024;

/// Errors that abort discovery as a whole.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The directory could not be listed.
    UnreadableDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The path exists but is not a directory.
    NotADirectory(PathBuf),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreadableDirectory { path, source } => {
                write!(f, "Could not read directory {}: {}", path.display(), source)
            }
            Self::NotADirectory(path) => write!(f, "{} is not a directory", path.display()),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// An image found in the working directory.
///
/// `file_name` is the current name relative to the directory. Renaming
/// updates it and records the name the file had before, once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDescriptor {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Lowercase format tag, used as the extension of generated names.
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_color: Option<[u8; 3]>,
}

impl ImageDescriptor {
    pub fn new(file_name: &str, width: u32, height: u32, format: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            original_name: None,
            width,
            height,
            format: format.to_lowercase(),
            average_color: None,
        }
    }

    /// Reads format and dimensions of `dir/file_name`, decoding the pixels
    /// only when `with_color` is set.
    ///
    /// Returns `None` for anything that is not a decodable image.
    pub fn load(dir: &Path, file_name: &str, with_color: bool) -> Option<Self> {
        let path = dir.join(file_name);

        if !looks_like_image(&path) {
            log::debug!("Skipping {}: not image content", path.display());
            return None;
        }

        let reader = match ImageReader::open(&path).and_then(|r| r.with_guessed_format()) {
            Ok(reader) => reader,
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };
        let Some(format) = reader.format() else {
            log::debug!("Skipping {}: unknown image format", path.display());
            return None;
        };
        let tag = format_tag(format);

        let descriptor = if with_color {
            let decoded = match reader.decode() {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::debug!("Skipping {}: {}", path.display(), e);
                    return None;
                }
            };
            let rgb = decoded.to_rgb8();
            let mut descriptor = Self::new(file_name, rgb.width(), rgb.height(), &tag);
            descriptor.average_color = average_color(&rgb);
            descriptor
        } else {
            match reader.into_dimensions() {
                Ok((width, height)) => Self::new(file_name, width, height, &tag),
                Err(e) => {
                    log::debug!("Skipping {}: {}", path.display(), e);
                    return None;
                }
            }
        };
        Some(descriptor)
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// The name the file had before it was first renamed, or its current
    /// name if it never was.
    pub fn original_or_current(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.file_name)
    }

    /// Whether the file has been renamed.
    pub fn is_renamed(&self) -> bool {
        self.original_name
            .as_deref()
            .is_some_and(|original| original != self.file_name)
    }
}

fn looks_like_image(path: &Path) -> bool {
    let mut header = Vec::new();
    match File::open(path).and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut header)) {
        Ok(_) => infer::is_image(&header),
        Err(_) => false,
    }
}

/// Lowercase tag for a decoded format, e.g. `jpeg` or `png`.
pub fn format_tag(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Per-channel floored mean of all pixels, or `None` for an empty image.
pub fn average_color(image: &image::RgbImage) -> Option<[u8; 3]> {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }
    Some(sums.map(|sum| (sum / count) as u8))
}

/// Converts an RGB triple to (hue, saturation, value), each in `[0, 1]`.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    if delta == 0.0 {
        return (0.0, 0.0, v);
    }
    let s = delta / max;

    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h / 6.0, s, v)
}

/// Lists the regular files in `dir` that pass `filters`, sorted by name.
///
/// # Errors
///
/// Returns an error if `dir` is not a directory or cannot be read.
pub fn list_candidates(
    dir: &Path,
    filters: &CompiledFilters,
) -> Result<Vec<String>, DiscoveryError> {
    if dir.exists() && !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| DiscoveryError::UnreadableDirectory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                log::warn!("Skipping non UTF-8 filename {:?}", raw);
                continue;
            }
        };
        if filters.should_include(Path::new(&name)) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Loads each named file in `dir`, keeping only decodable images.
///
/// `on_file` is called once per name, after it has been examined.
pub fn load_images(
    dir: &Path,
    names: &[String],
    with_color: bool,
    mut on_file: impl FnMut(&str),
) -> Vec<ImageDescriptor> {
    let mut images = Vec::with_capacity(names.len());
    for name in names {
        if let Some(image) = ImageDescriptor::load(dir, name, with_color) {
            images.push(image);
        }
        on_file(name);
    }
    log::info!(
        "Found {} images among {} files in {}",
        images.len(),
        names.len(),
        dir.display()
    );
    images
}

/// Lists, filters and loads every image in `dir`.
pub fn discover_images(
    dir: &Path,
    filters: &CompiledFilters,
    with_color: bool,
    on_file: impl FnMut(&str),
) -> Result<Vec<ImageDescriptor>, DiscoveryError> {
    let candidates = list_candidates(dir, filters)?;
    Ok(load_images(dir, &candidates, with_color, on_file))
}
