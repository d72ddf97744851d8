//! Tests for seeded selection of cells and variants

#[cfg(test)]
mod tests {
    use wavetile::algorithm::domain::Wave;
    use wavetile::algorithm::selection::{
        ENTROPY_NOISE, RandomSelector, entropy_noise, lowest_entropy_cell,
    };
    use wavetile::spatial::topology::GridTopology;

    // Tests the same seed gives the same sequence
    // Verified by seeding from entropy in new
    #[test]
    fn test_seeded_reproducibility() {
        let mut a = RandomSelector::new(42);
        let mut b = RandomSelector::new(42);
        for _ in 0..10 {
            assert!((a.unit() - b.unit()).abs() < f64::EPSILON);
        }
        assert_eq!(a.next_seed(), b.next_seed());
    }

    // Tests zero-weight options are never chosen
    // Verified by choosing uniformly
    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut selector = RandomSelector::new(7);
        for _ in 0..100 {
            assert_eq!(selector.weighted_choice(&[0.0, 1.0, 0.0]), 1);
        }
        assert_eq!(selector.weighted_choice(&[]), 0);
    }

    // Tests choices follow the weights
    // Verified by ignoring weights in the cumulative scan
    #[test]
    fn test_weighted_choice_distribution() {
        let mut selector = RandomSelector::new(123);
        let mut counts = [0usize; 2];
        for _ in 0..2000 {
            if let Some(count) = counts.get_mut(selector.weighted_choice(&[1.0, 3.0])) {
                *count += 1;
            }
        }
        assert!(counts[1] > counts[0] * 2, "{counts:?}");
    }

    // Tests noise stays below the tie-breaking scale
    // Verified by scaling noise by 1
    #[test]
    fn test_entropy_noise_scale() {
        let mut selector = RandomSelector::new(1);
        let noise = entropy_noise(&mut selector, 50);
        assert_eq!(noise.len(), 50);
        assert!(noise.iter().all(|&n| (0.0..ENTROPY_NOISE).contains(&n)));
    }

    // Tests the cell with fewest options wins and decided cells are skipped
    // Verified by choosing the highest entropy cell
    #[test]
    fn test_lowest_entropy_cell() {
        let topology = GridTopology::new([3, 1, 1]);
        let mut wave = Wave::new(&topology, &[1.0; 4]);
        wave.remove(1, 0);
        wave.remove(2, 0);
        wave.remove(2, 1);
        wave.remove(2, 2);
        let noise = vec![0.0; 3];
        assert_eq!(lowest_entropy_cell(&topology, &wave, &noise), Some(1));

        wave.remove(0, 0);
        wave.remove(0, 1);
        wave.remove(0, 2);
        wave.remove(1, 1);
        wave.remove(1, 2);
        assert_eq!(lowest_entropy_cell(&topology, &wave, &noise), None);
    }
}
