//! Foreground mask and blob extraction
//!
//! The background-subtraction collaborator hands over a binary mask; this
//! module finds its connected foreground regions and their bounding boxes.

use super::bbox::BoundingBox;

/// Binary foreground mask, row-major, non-zero = foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ForegroundMask {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// All-background mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0; width as usize * height as usize])
    }

    /// Frame area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Non-zero area and data length matching the dimensions.
    pub fn is_valid(&self) -> bool {
        self.area() > 0 && self.data.len() as u64 == self.area()
    }

    /// Mark a rectangle as foreground (clipped to the mask).
    pub fn fill_rect(&mut self, rect: BoundingBox) {
        let x_end = (rect.right()).min(self.width as u64) as usize;
        let y_end = (rect.bottom()).min(self.height as u64) as usize;
        let width = self.width as usize;
        for y in rect.y as usize..y_end {
            for x in rect.x as usize..x_end {
                if let Some(px) = self.data.get_mut(y * width + x) {
                    *px = 255;
                }
            }
        }
    }

    fn is_foreground(&self, idx: usize) -> bool {
        self.data[idx] != 0
    }
}

/// Connected foreground region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub bbox: BoundingBox,
    /// Foreground pixel count
    pub area: u64,
}

/// 8-connected foreground components of `mask`.
///
/// Returns nothing for a degenerate mask.
pub fn extract_blobs(mask: &ForegroundMask) -> Vec<Blob> {
    if !mask.is_valid() {
        return Vec::new();
    }

    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut visited = vec![false; width * height];
    let mut stack: Vec<usize> = Vec::new();
    let mut blobs = Vec::new();

    for start in 0..width * height {
        if visited[start] || !mask.is_foreground(start) {
            continue;
        }

        visited[start] = true;
        stack.push(start);

        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut area = 0u64;

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let y_lo = y.saturating_sub(1);
            let y_hi = (y + 1).min(height - 1);
            let x_lo = x.saturating_sub(1);
            let x_hi = (x + 1).min(width - 1);
            for ny in y_lo..=y_hi {
                for nx in x_lo..=x_hi {
                    let n = ny * width + nx;
                    if !visited[n] && mask.is_foreground(n) {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        blobs.push(Blob {
            bbox: BoundingBox::new(
                min_x as u32,
                min_y as u32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            ),
            area,
        });
    }

    blobs
}

/// Largest blob whose area reaches `min_area_ratio` of the frame area.
///
/// The nearest person projects the largest region, so the largest blob is
/// taken as the monitored subject.
pub fn largest_blob(mask: &ForegroundMask, min_area_ratio: f32) -> Option<Blob> {
    let min_area = mask.area() as f64 * min_area_ratio.max(0.0) as f64;
    extract_blobs(mask)
        .into_iter()
        .filter(|b| b.area as f64 >= min_area)
        .max_by_key(|b| b.area)
}
