use std::collections::VecDeque;

use image::GrayImage;
use crate::{error::Result, traits::RegionDetector, types::Component};

/// Keeps the 4-connected component with the largest pixel count.
///
/// Stray brush marks produce small components of their own and are dropped
/// instead of stretching the region to cover them.
#[derive(Debug, Clone, Default)]
pub struct LargestComponentDetector;

impl RegionDetector for LargestComponentDetector {
    fn detect(&self, binary: &GrayImage) -> Result<(Option<Component>, usize)> {
        let components = connected_components(binary);
        let count = components.len();
        // max_by_key keeps the last maximum; fold keeps the first in scan order
        let largest = components.into_iter().fold(None, |best: Option<Component>, c| match best {
            Some(b) if b.area >= c.area => Some(b),
            _ => Some(c),
        });
        Ok((largest, count))
    }
}

/// Partition the non-zero pixels of `binary` into 4-connected components.
///
/// Iterative BFS over a flat visited bitmap indexed by `y * width + x`.
pub fn connected_components(binary: &GrayImage) -> Vec<Component> {
    let (w, h) = binary.dimensions();
    let on = binary.as_raw();
    let mut visited = vec![false; on.len()];
    let mut queue: VecDeque<(u32, u32)> = VecDeque::with_capacity(1024);
    let mut components = Vec::new();

    for start in 0..on.len() {
        if visited[start] || on[start] == 0 {
            continue;
        }
        visited[start] = true;
        let sx = (start % w as usize) as u32;
        let sy = (start / w as usize) as u32;
        queue.push_back((sx, sy));

        let mut c = Component { area: 0, min_x: sx, min_y: sy, max_x: sx, max_y: sy };

        while let Some((px, py)) = queue.pop_front() {
            c.area += 1;
            c.min_x = c.min_x.min(px);
            c.min_y = c.min_y.min(py);
            c.max_x = c.max_x.max(px);
            c.max_y = c.max_y.max(py);

            let neighbors = [
                (px.wrapping_sub(1), py),
                (px + 1, py),
                (px, py.wrapping_sub(1)),
                (px, py + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= w || ny >= h {
                    continue;
                }
                let idx = pixel_index(nx, ny, w);
                if visited[idx] || on[idx] == 0 {
                    continue;
                }
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }

        components.push(c);
    }

    components
}

/// Row-major offset, computed in `usize` so large grids cannot wrap.
fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_components() {
        let img = GrayImage::new(20, 20);
        let (largest, count) = LargestComponentDetector.detect(&img).unwrap();
        assert!(largest.is_none());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_largest_of_two_blobs() {
        let mut img = GrayImage::new(50, 50);
        fill(&mut img, 2, 2, 6, 6);
        fill(&mut img, 20, 25, 40, 45);

        let (largest, count) = LargestComponentDetector.detect(&img).unwrap();
        let largest = largest.unwrap();
        assert_eq!(count, 2);
        assert_eq!(largest.area, 400);
        assert_eq!((largest.min_x, largest.min_y, largest.max_x, largest.max_y), (20, 25, 39, 44));
    }

    #[test]
    fn test_diagonal_pixels_are_not_connected() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(0, 0, Luma([255u8]));
        img.put_pixel(1, 1, Luma([255u8]));
        img.put_pixel(2, 2, Luma([255u8]));
        assert_eq!(connected_components(&img).len(), 3);
    }

    #[test]
    fn test_l_shaped_stroke_is_one_component() {
        let mut img = GrayImage::new(30, 30);
        fill(&mut img, 5, 5, 7, 25);
        fill(&mut img, 5, 23, 25, 25);
        let components = connected_components(&img);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].max_x, 24);
        assert_eq!(components[0].max_y, 24);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_pixel_index_past_u32_range() {
        // 70_000 x 70_000 has more pixels than u32 can count
        assert_eq!(pixel_index(69_999, 69_999, 70_000), 4_899_999_999);
        assert_eq!(pixel_index(3, 2, 10), 23);
    }
}
