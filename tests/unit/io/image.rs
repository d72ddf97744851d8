//! Tests for layer image export

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use tempfile::TempDir;
    use wavetile::algorithm::completion::{Completion, TileInstance};
    use wavetile::algorithm::model::TileModel;
    use wavetile::io::configuration::{IMAGE_CELL_PIXELS, IMAGE_LAYER_GAP};
    use wavetile::io::image::{export_layers_as_png, tile_colors};
    use wavetile::spatial::direction::FaceDir;
    use wavetile::spatial::faces::FaceDetails;
    use wavetile::spatial::palette::Palette;
    use wavetile::spatial::tiles::TileDefinition;
    use wavetile::spatial::transform::Rotation;

    fn instance(tile_id: usize, cell: [i32; 3]) -> TileInstance {
        TileInstance {
            tile_id,
            tile: Arc::new(TileDefinition::new("cell")),
            rotation: Rotation::IDENTITY,
            position: [0.0; 3],
            yaw_degrees: 0.0,
            scale: [1.0; 3],
            cells: vec![cell],
        }
    }

    // Tests tiles take the palette colour of their top face
    // Verified by reading the bottom face instead
    #[test]
    fn test_tile_colors() {
        let model = TileModel::build(
            vec![
                TileDefinition::new("grass").with_face([0, 0, 0], FaceDir::Up, FaceDetails::uniform(2)),
                TileDefinition::new("plain"),
                TileDefinition::new("other"),
            ],
            Palette::default(),
        )
        .unwrap();

        let colors = tile_colors(&model);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], Palette::default().entries()[2].color);
        assert_eq!(colors[1][3], 255);
        assert_ne!(colors[1], colors[2]);
    }

    // Tests layers are laid out side by side with a gap
    // Verified by stacking layers vertically
    #[test]
    fn test_export_layers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("layers.png");
        let completion = Completion {
            success: true,
            instances: vec![instance(0, [0, 0, 0]), instance(1, [1, 1, 2])],
            ..Completion::default()
        };
        let colors = [[255, 0, 0, 255], [0, 0, 255, 255]];

        export_layers_as_png(&completion, [2, 2, 3], &colors, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        let panel = 2 * IMAGE_CELL_PIXELS;
        assert_eq!(img.width(), panel * 2 + IMAGE_LAYER_GAP);
        assert_eq!(img.height(), 3 * IMAGE_CELL_PIXELS);

        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        let x = panel + IMAGE_LAYER_GAP + IMAGE_CELL_PIXELS;
        let y = 2 * IMAGE_CELL_PIXELS;
        assert_eq!(img.get_pixel(x, y).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(panel, 0).0[3], 0);
    }
}
