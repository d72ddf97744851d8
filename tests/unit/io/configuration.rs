//! Tests for generator constants and defaults

#[cfg(test)]
mod tests {
    use wavetile::algorithm::generator::GeneratorConfig;
    use wavetile::io::configuration::{
        DEFAULT_BACKTRACK, DEFAULT_CELL_SIZE, DEFAULT_RETRIES, DEFAULT_SIZE, IMAGE_CELL_PIXELS,
        IMAGE_LAYER_GAP, MAX_GRID_CELLS, OUTPUT_SUFFIX, PROGRESS_BAR_STEPS, PROGRESS_BAR_WIDTH,
        PROGRESS_INTERVAL, RANDOM_SEED,
    };
    use std::time::Duration;

    // Tests the default grid fits inside the cell limit
    // Verified by shrinking the cell limit
    #[test]
    fn test_default_grid_within_limit() {
        assert_eq!(DEFAULT_SIZE, [10, 1, 10]);
        assert!(DEFAULT_SIZE.iter().product::<usize>() <= MAX_GRID_CELLS);
        assert_eq!(MAX_GRID_CELLS, 4_000_000);
    }

    // Tests the default cell is a unit cube
    // Verified by changing one axis
    #[test]
    fn test_default_cell_size() {
        assert_eq!(DEFAULT_CELL_SIZE, [1.0, 1.0, 1.0]);
    }

    // Tests seed zero means a random seed
    // Verified by changing the sentinel
    #[test]
    fn test_random_seed_sentinel() {
        assert_eq!(RANDOM_SEED, 0);
    }

    // Tests search defaults
    // Verified by disabling backtracking by default
    #[test]
    fn test_search_defaults() {
        assert!(DEFAULT_BACKTRACK);
        assert_eq!(DEFAULT_RETRIES, 5);

        let config = GeneratorConfig::default();
        assert_eq!(config.size, DEFAULT_SIZE);
        assert_eq!(config.backtrack, DEFAULT_BACKTRACK);
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert!(config.backtrack_limit.is_none());
        assert!(config.skybox.is_none());
    }

    // Tests progress reporting settings
    // Verified by changing the interval
    #[test]
    fn test_progress_settings() {
        assert_eq!(PROGRESS_INTERVAL, Duration::from_millis(100));
        assert_eq!(PROGRESS_BAR_WIDTH, 40);
        assert_eq!(PROGRESS_BAR_STEPS, 1000);
    }

    // Tests filesystem safety of suffix
    // Verified by adding special character
    #[test]
    fn test_output_suffix_no_special_chars() {
        assert!(OUTPUT_SUFFIX.starts_with('_'));
        for ch in OUTPUT_SUFFIX.chars() {
            assert!(
                ch.is_alphanumeric() || ch == '_' || ch == '-',
                "Output suffix contains invalid character: {ch}"
            );
        }
    }

    // Tests image layout constants
    // Verified by setting the cell size to zero
    #[test]
    fn test_image_layout() {
        assert_eq!(IMAGE_CELL_PIXELS, 8);
        assert_eq!(IMAGE_LAYER_GAP, 4);
    }
}
