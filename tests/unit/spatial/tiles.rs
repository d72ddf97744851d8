//! Tests for tile definitions and their editing operations

#[cfg(test)]
mod tests {
    use wavetile::spatial::direction::FaceDir;
    use wavetile::spatial::faces::FaceDetails;
    use wavetile::spatial::tiles::TileDefinition;

    fn bar() -> TileDefinition {
        let mut tile = TileDefinition::cube("bar", FaceDetails::uniform(1));
        tile.add_offset([1, 0, 0]);
        tile
    }

    // Tests a cube has six painted faces and one cell
    // Verified by skipping Back in the cube constructor
    #[test]
    fn test_cube() {
        let tile = TileDefinition::cube("stone", FaceDetails::uniform(2));
        assert_eq!(tile.faces.len(), 6);
        assert!(!tile.is_big());
        for dir in FaceDir::ALL {
            assert_eq!(tile.face([0, 0, 0], dir), Some(&FaceDetails::uniform(2)));
        }
    }

    // Tests adding a cell drops faces that became internal
    // Verified by keeping all faces of existing cells
    #[test]
    fn test_add_offset_updates_faces() {
        let tile = bar();
        assert!(tile.is_big());
        assert_eq!(tile.faces.len(), 10);
        assert!(tile.face([0, 0, 0], FaceDir::Right).is_none());
        assert!(tile.face([1, 0, 0], FaceDir::Left).is_none());
        assert_eq!(tile.face([1, 0, 0], FaceDir::Right), Some(&FaceDetails::default()));
        assert!(tile.is_internal([0, 0, 0], FaceDir::Right));
    }

    // Tests adding an occupied cell is rejected
    // Verified by removing the containment check
    #[test]
    fn test_add_existing_offset() {
        let mut tile = bar();
        assert!(!tile.add_offset([1, 0, 0]));
        assert_eq!(tile.offsets.len(), 2);
    }

    // Tests removing a cell restores blank faces on its neighbours
    // Verified by not re-adding faces that became external
    #[test]
    fn test_remove_offset_restores_faces() {
        let mut tile = bar();
        assert!(tile.remove_offset([1, 0, 0]));
        assert_eq!(tile.offsets, vec![[0, 0, 0]]);
        assert_eq!(tile.faces.len(), 6);
        assert_eq!(tile.face([0, 0, 0], FaceDir::Right), Some(&FaceDetails::default()));
        assert!(!tile.remove_offset([0, 0, 0]));
    }

    // Tests painting is refused on internal faces and empty cells
    // Verified by always pushing the face in set_face
    #[test]
    fn test_set_face_rules() {
        let mut tile = bar();
        assert!(!tile.set_face([0, 0, 0], FaceDir::Right, FaceDetails::uniform(3)));
        assert!(!tile.set_face([5, 0, 0], FaceDir::Up, FaceDetails::uniform(3)));
        assert!(tile.set_face([0, 0, 0], FaceDir::Up, FaceDetails::uniform(3)));
        assert_eq!(tile.face([0, 0, 0], FaceDir::Up), Some(&FaceDetails::uniform(3)));
        assert_eq!(tile.faces.len(), 10);
    }

    // Tests outward faces without paint count as blank
    // Verified by returning None for unpainted outward faces
    #[test]
    fn test_try_face_and_external_faces() {
        let mut tile = TileDefinition::new("sparse");
        tile.faces.clear();
        assert_eq!(tile.try_face([0, 0, 0], FaceDir::Up), Some(FaceDetails::default()));
        assert_eq!(tile.external_faces().count(), 6);
    }

    // Tests contiguity detection and bounds
    // Verified by only checking the first neighbour in the flood fill
    #[test]
    fn test_contiguity_and_bounds() {
        let mut tile = bar();
        assert!(tile.is_contiguous());
        tile.offsets.push([3, 0, 0]);
        assert!(!tile.is_contiguous());
        assert_eq!(tile.bounds(), ([0, 0, 0], [3, 0, 0]));
    }

    // Tests catalogue defaults when fields are omitted
    // Verified by removing the serde default on offsets
    #[test]
    fn test_deserialize_defaults() {
        let parsed: Result<TileDefinition, _> = serde_json::from_str(r#"{"name": "plain"}"#);
        let Ok(tile) = parsed else {
            panic!("tile should parse");
        };
        assert_eq!(tile.offsets, vec![[0, 0, 0]]);
        assert!(tile.rotatable && tile.reflectable);
        assert!((tile.weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(tile.tile_size, [1.0, 1.0, 1.0]);
    }

    // Tests the builder helpers
    // Verified by ignoring the reflectable argument
    #[test]
    fn test_builders() {
        let tile = TileDefinition::new("t")
            .with_weight(3.0)
            .with_symmetry(false, true)
            .with_face([0, 0, 0], FaceDir::Down, FaceDetails::uniform(1));
        assert!((tile.weight - 3.0).abs() < f64::EPSILON);
        assert!(!tile.rotatable);
        assert!(tile.reflectable);
        assert_eq!(tile.face([0, 0, 0], FaceDir::Down), Some(&FaceDetails::uniform(1)));
    }
}
