//! Tests for arc-consistency propagation and backtracking

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use wavetile::algorithm::bitset::VariantSet;
    use wavetile::algorithm::constraints::{
        ConstraintStatus, CountComparison, CountConstraint, TileConstraint,
    };
    use wavetile::algorithm::model::TileModel;
    use wavetile::algorithm::propagator::{
        BacktrackDepth, BanCause, Propagator, PropagatorOptions, Resolution,
    };
    use wavetile::spatial::direction::FaceDir;
    use wavetile::spatial::faces::FaceDetails;
    use wavetile::spatial::palette::Palette;
    use wavetile::spatial::tiles::TileDefinition;
    use wavetile::spatial::topology::GridTopology;

    fn model(tiles: Vec<TileDefinition>) -> Arc<TileModel> {
        match TileModel::build(tiles, Palette::default()) {
            Ok(model) => Arc::new(model),
            Err(e) => panic!("model should build: {e}"),
        }
    }

    fn fixed_cube(name: &str, color: u8) -> TileDefinition {
        TileDefinition::cube(name, FaceDetails::uniform(color)).with_symmetry(false, false)
    }

    fn red_green() -> Arc<TileModel> {
        model(vec![fixed_cube("red", 1), fixed_cube("green", 2)])
    }

    /// Empties the other cell of a two-cell grid whenever a cell holds variant 0
    #[derive(Debug)]
    struct LonelyFirst;

    impl TileConstraint for LonelyFirst {
        fn check(&self, _propagator: &Propagator) -> ConstraintStatus {
            ConstraintStatus::Consistent
        }

        fn propagate(&self, propagator: &mut Propagator) -> ConstraintStatus {
            for (cell, other) in [(0, 1), (1, 0)] {
                if propagator.decided_variant(cell) == Some(0) {
                    propagator.exclude(other, 0);
                    propagator.exclude(other, 1);
                }
            }
            ConstraintStatus::Consistent
        }
    }

    fn options(backtrack: BacktrackDepth) -> PropagatorOptions {
        PropagatorOptions {
            backtrack,
            constraints: Vec::new(),
        }
    }

    // Tests the first step makes the initial domains consistent
    // Verified by starting with an empty queue
    #[test]
    fn test_initial_pass_finds_contradiction() {
        let clash = TileDefinition::new("clash")
            .with_symmetry(false, false)
            .with_face([0, 0, 0], FaceDir::Right, FaceDetails::uniform(1))
            .with_face([0, 0, 0], FaceDir::Left, FaceDetails::uniform(2));
        let mut propagator = Propagator::new(
            model(vec![clash]),
            GridTopology::new([2, 1, 1]),
            PropagatorOptions::default(),
            1,
        );
        assert_eq!(propagator.step(), Resolution::Contradiction);
        assert!(propagator.contradiction_cell().is_some());
        assert_eq!(propagator.step(), Resolution::Contradiction);
    }

    // Tests selecting a variant spreads to compatible neighbours
    // Verified by not enqueueing cells after a removal
    #[test]
    fn test_select_propagates() {
        let model = red_green();
        let mut propagator = Propagator::new(
            Arc::clone(&model),
            GridTopology::new([3, 1, 1]),
            options(BacktrackDepth::Disabled),
            1,
        );
        let red = VariantSet::from_indices(model.variant_count(), [0]);
        assert_eq!(propagator.select(0, &red), Resolution::Decided);
        for cell in 0..3 {
            assert_eq!(propagator.decided_variant(cell), Some(0));
        }
        assert!((propagator.progress() - 1.0).abs() < f64::EPSILON);
    }

    // Tests banning a variant spreads its consequences
    // Verified by banning without propagating
    #[test]
    fn test_ban_propagates() {
        let mut propagator = Propagator::new(
            red_green(),
            GridTopology::new([2, 2, 1]),
            options(BacktrackDepth::Disabled),
            1,
        );
        assert_eq!(propagator.ban(3, 0), Resolution::Decided);
        assert_eq!(propagator.decided_variant(0), Some(1));
    }

    // Tests constraint-facing removals wait for an explicit propagate
    // Verified by propagating inside exclude
    #[test]
    fn test_exclude_defers_propagation() {
        let mut propagator = Propagator::new(
            red_green(),
            GridTopology::new([2, 1, 1]),
            options(BacktrackDepth::Disabled),
            1,
        );
        assert_eq!(propagator.step(), Resolution::Undecided);
        assert!(propagator.exclude(0, 0));
        assert!(!propagator.exclude(0, 0));
        assert_eq!(propagator.wave().remaining(1), 2);
        assert!(propagator.propagate());
        assert_eq!(propagator.decided_variant(1), Some(1));

        let mut other = Propagator::new(
            red_green(),
            GridTopology::new([2, 1, 1]),
            options(BacktrackDepth::Disabled),
            1,
        );
        assert!(other.restrict(1, &VariantSet::from_indices(2, [0])));
        assert!(!other.restrict(1, &VariantSet::from_indices(2, [0])));
    }

    // Tests a full run on an unconstrained tile decides every cell
    // Verified by stopping after the first collapse
    #[test]
    fn test_run_decides() {
        let mut propagator = Propagator::new(
            model(vec![TileDefinition::new("blank")]),
            GridTopology::new([3, 2, 3]),
            PropagatorOptions::default(),
            99,
        );
        assert_eq!(propagator.run(), Resolution::Decided);
        assert!(!propagator.collapse_history().is_empty());
        assert_eq!(propagator.backtrack_count(), 0);
        for cell in 0..18 {
            assert!(propagator.decided_variant(cell).is_some());
        }
    }

    // Tests collapses are written to the trail only while backtracking
    // Verified by recording removals before any decision exists
    #[test]
    fn test_trail_records_collapse() {
        let blank = model(vec![TileDefinition::new("blank")]);
        let mut propagator = Propagator::new(
            Arc::clone(&blank),
            GridTopology::new([2, 1, 1]),
            PropagatorOptions::default(),
            5,
        );
        propagator.step();
        assert!(propagator.trail().is_empty());
        propagator.step();
        assert_eq!(propagator.trail().len(), 7);
        assert!(
            propagator
                .trail()
                .iter()
                .all(|record| record.cause == BanCause::Collapse)
        );

        let mut plain = Propagator::new(
            blank,
            GridTopology::new([2, 1, 1]),
            options(BacktrackDepth::Disabled),
            5,
        );
        plain.step();
        plain.step();
        assert!(plain.trail().is_empty());
    }

    fn demanding_options(backtrack: BacktrackDepth, model: &TileModel) -> PropagatorOptions {
        PropagatorOptions {
            backtrack,
            constraints: vec![
                CountConstraint::new(model, &[0], CountComparison::AtLeast, 3, false).shared(),
            ],
        }
    }

    // Tests a contradiction undoes the latest choice and excludes it
    // Verified by keeping the undone choice in the domain
    #[test]
    fn test_backtracking_recovers() {
        let model = model(vec![
            fixed_cube("red", 1),
            fixed_cube("blank", 0).with_weight(1000.0),
        ]);
        let mut propagator = Propagator::new(
            Arc::clone(&model),
            GridTopology::new([3, 1, 1]),
            demanding_options(BacktrackDepth::Unlimited, &model),
            17,
        );
        assert_eq!(propagator.run(), Resolution::Decided);
        assert!(propagator.backtrack_count() > 0);
        for cell in 0..3 {
            assert_eq!(propagator.decided_variant(cell), Some(0));
        }
    }

    // Tests a recovered contradiction no longer reports its emptied cell
    // Verified by leaving the contradiction cell set when backtracking
    #[test]
    fn test_backtracking_clears_contradiction_cell() {
        let model = model(vec![
            TileDefinition::new("first").with_symmetry(false, false).with_weight(1000.0),
            TileDefinition::new("second").with_symmetry(false, false),
        ]);
        let lonely: Arc<dyn TileConstraint> = Arc::new(LonelyFirst);
        let mut propagator = Propagator::new(
            model,
            GridTopology::new([2, 1, 1]),
            PropagatorOptions {
                backtrack: BacktrackDepth::Unlimited,
                constraints: vec![lonely],
            },
            11,
        );
        assert_eq!(propagator.run(), Resolution::Decided);
        assert!(propagator.backtrack_count() > 0);
        assert_eq!(propagator.contradiction_cell(), None);
        assert_eq!(propagator.decided_variant(0), Some(1));
        assert_eq!(propagator.decided_variant(1), Some(1));
    }

    // Tests the same situation is final without backtracking
    // Verified by treating Disabled as Unlimited
    #[test]
    fn test_no_backtracking_contradicts() {
        let model = model(vec![
            fixed_cube("red", 1),
            fixed_cube("blank", 0).with_weight(1000.0),
        ]);
        for depth in [BacktrackDepth::Disabled, BacktrackDepth::Limited(0)] {
            let mut propagator = Propagator::new(
                Arc::clone(&model),
                GridTopology::new([3, 1, 1]),
                demanding_options(depth, &model),
                17,
            );
            assert_eq!(propagator.run(), Resolution::Contradiction);
            assert_eq!(propagator.backtrack_count(), 0);
        }
    }

    // Tests a short history still recovers from the latest choice
    // Verified by clearing the whole trail when trimming history
    #[test]
    fn test_limited_backtracking() {
        let model = model(vec![
            fixed_cube("red", 1),
            fixed_cube("blank", 0).with_weight(1000.0),
        ]);
        let mut propagator = Propagator::new(
            Arc::clone(&model),
            GridTopology::new([3, 1, 1]),
            demanding_options(BacktrackDepth::Limited(1), &model),
            17,
        );
        assert_eq!(propagator.run(), Resolution::Decided);
        assert!(propagator.backtrack_count() > 0);
    }

    // Tests masked cells are ignored when deciding
    // Verified by requiring masked cells to hold a variant
    #[test]
    fn test_masked_cells_ignored() {
        let mut topology = GridTopology::new([3, 1, 1]);
        topology.set_active([1, 0, 0], false);
        let mut propagator = Propagator::new(
            red_green(),
            topology,
            PropagatorOptions::default(),
            3,
        );
        assert_eq!(propagator.run(), Resolution::Decided);
        assert_eq!(propagator.decided_variant(1), None);
        assert_eq!(propagator.cell_state(1).map(VariantSet::count), Some(0));
    }
}
