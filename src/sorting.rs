//! Sort methods and ordering of image descriptors.

use crate::image_info::{ImageDescriptor, rgb_to_hsv};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An attribute images can be ordered by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    /// Hue of the average color.
    Hue,
    /// Saturation of the average color.
    Saturation,
    /// Brightness (HSV value) of the average color.
    #[serde(alias = "brightness")]
    #[value(alias = "brightness")]
    Value,
    /// Total pixel count, ties broken by dimensions.
    Resolution,
    /// Width, then height.
    Dimensions,
}

impl SortMethod {
    /// Whether this method needs the average color of each image.
    pub fn needs_color(self) -> bool {
        matches!(
            self,
            SortMethod::Hue | SortMethod::Saturation | SortMethod::Value
        )
    }

    /// Compares two images by this method.
    ///
    /// Images without an average color sort before images that have one.
    pub fn compare(self, a: &ImageDescriptor, b: &ImageDescriptor) -> Ordering {
        match self {
            SortMethod::Hue => compare_hsv(a, b, |(h, _, _)| h),
            SortMethod::Saturation => compare_hsv(a, b, |(_, s, _)| s),
            SortMethod::Value => compare_hsv(a, b, |(_, _, v)| v),
            SortMethod::Resolution => a
                .pixel_count()
                .cmp(&b.pixel_count())
                .then_with(|| (a.width, a.height).cmp(&(b.width, b.height))),
            SortMethod::Dimensions => (a.width, a.height).cmp(&(b.width, b.height)),
        }
    }
}

fn compare_hsv(
    a: &ImageDescriptor,
    b: &ImageDescriptor,
    component: impl Fn((f32, f32, f32)) -> f32,
) -> Ordering {
    let key = |image: &ImageDescriptor| {
        image
            .average_color
            .map(|[r, g, b]| component(rgb_to_hsv(r, g, b)))
    };
    match (key(a), key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (x, y) => x.is_some().cmp(&y.is_some()),
    }
}

/// Stable-sorts `images` by `primary`, breaking ties with `secondary`, and
/// reverses the final order when `reverse` is set.
pub fn sort_images(
    images: &mut [ImageDescriptor],
    primary: SortMethod,
    secondary: Option<SortMethod>,
    reverse: bool,
) {
    images.sort_by(|a, b| {
        let ordering = primary.compare(a, b);
        match secondary {
            Some(method) => ordering.then_with(|| method.compare(a, b)),
            None => ordering,
        }
    });
    if reverse {
        images.reverse();
    }
}
