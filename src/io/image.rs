//! PNG export of generated volumes, one panel per horizontal layer

use crate::algorithm::completion::Completion;
use crate::algorithm::model::TileModel;
use crate::io::configuration::{IMAGE_CELL_PIXELS, IMAGE_LAYER_GAP};
use crate::io::error::{GenerationError, Result};
use crate::spatial::direction::FaceDir;
use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Display colour of every tile, indexed by tile id
///
/// Uses the palette colour painted on the centre of the tile's top face, or a
/// colour derived from the tile id when the top is unpainted.
pub fn tile_colors(model: &TileModel) -> Vec<[u8; 4]> {
    model
        .tiles()
        .iter()
        .enumerate()
        .map(|(id, tile)| {
            let top = tile
                .offsets
                .iter()
                .max_by_key(|offset| offset[1])
                .and_then(|&offset| tile.try_face(offset, FaceDir::Up))
                .and_then(|face| face.get(0, 0))
                .filter(|&paint| paint != 0);
            top.and_then(|paint| model.palette().entries().get(usize::from(paint)))
                .map_or_else(|| generated_color(id), |entry| entry.color)
        })
        .collect()
}

fn generated_color(id: usize) -> [u8; 4] {
    // Golden-angle hue steps keep neighbouring ids apart
    let hue = (id as f64 * 137.507_764) % 360.0;
    let sector = hue / 60.0;
    let x = 1.0 - (sector % 2.0 - 1.0).abs();
    let (r, g, b) = match sector as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |v: f64| (v.mul_add(170.0, 60.0)) as u8;
    [channel(r), channel(g), channel(b), 255]
}

/// Export every y-layer of a completion side by side as a PNG
///
/// Layers run left to right from the bottom; within a layer X runs right and
/// Z runs down. Empty and masked cells are transparent.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be saved.
pub fn export_layers_as_png(
    completion: &Completion,
    size: [usize; 3],
    colors: &[[u8; 4]],
    output_path: &Path,
) -> Result<()> {
    let [w, h, d] = size.map(|extent| extent as u32);
    let panel_width = w * IMAGE_CELL_PIXELS;
    let width = (panel_width + IMAGE_LAYER_GAP) * h.max(1) - IMAGE_LAYER_GAP;
    let height = d.max(1) * IMAGE_CELL_PIXELS;

    let mut img = ImageBuffer::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 0]));

    for instance in &completion.instances {
        let rgba = colors.get(instance.tile_id).copied().unwrap_or([0, 0, 0, 255]);
        for cell in &instance.cells {
            let [x, y, z] = cell.map(|c| c as u32);
            let left = y * (panel_width + IMAGE_LAYER_GAP) + x * IMAGE_CELL_PIXELS;
            let top = z * IMAGE_CELL_PIXELS;
            for dy in 0..IMAGE_CELL_PIXELS {
                for dx in 0..IMAGE_CELL_PIXELS {
                    if let Some(pixel) = img.get_pixel_mut_checked(left + dx, top + dy) {
                        *pixel = Rgba(rgba);
                    }
                }
            }
        }
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GenerationError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path)
        .map_err(|e| GenerationError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
