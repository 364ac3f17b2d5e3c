//! Strictly increasing candidate names for renamed images.

use crate::codec::Codec;
use crate::image_info::ImageDescriptor;

/// Infinite counter sequence `start, start + step, start + 2 * step, ...`.
///
/// A step of zero is treated as one and a negative step as its absolute
/// value, so the sequence always increases. The generator can only be
/// restarted by constructing a new one.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    start: u64,
    step: u64,
    next: Option<u64>,
    codec: Codec,
    pad_width: usize,
}

impl NameGenerator {
    /// Creates a generator with the canonical base-36 codec and no padding.
    pub fn new(start: u64, step: i64) -> Self {
        Self::with_codec(start, step, Codec::base36(), 0)
    }

    /// Creates a generator that encodes counters with `codec`, padded to at
    /// least `pad_width` symbols.
    pub fn with_codec(start: u64, step: i64, codec: Codec, pad_width: usize) -> Self {
        let step = match step.unsigned_abs() {
            0 => 1,
            step => step,
        };
        Self {
            start,
            step,
            next: Some(start),
            codec,
            pad_width,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// The normalized, always positive step.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Builds `<encoded>_<width>x<height>.<format>` for a counter value.
    pub fn candidate_name(&self, counter: u64, image: &ImageDescriptor) -> String {
        format!(
            "{}_{}x{}.{}",
            self.codec.encode_padded(counter, self.pad_width),
            image.width,
            image.height,
            image.format.to_lowercase()
        )
    }

    /// Advances until a candidate for `image` is found for which `exists`
    /// returns false.
    ///
    /// Returns `None` only once the counter has run past `u64::MAX`.
    pub fn next_free_name(
        &mut self,
        image: &ImageDescriptor,
        mut exists: impl FnMut(&str) -> bool,
    ) -> Option<String> {
        while let Some(counter) = self.next() {
            let candidate = self.candidate_name(counter, image);
            if !exists(&candidate) {
                return Some(candidate);
            }
            log::debug!("Candidate {} already exists, skipping", candidate);
        }
        None
    }
}

impl Iterator for NameGenerator {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = current.checked_add(self.step);
        Some(current)
    }
}
