//! Tests for face directions and grid vector helpers

#[cfg(test)]
mod tests {
    use wavetile::spatial::direction::{FaceDir, add, cross, dot, sub};

    // Tests every direction's index matches its position in ALL
    // Verified by swapping two variants in ALL
    #[test]
    fn test_index_matches_all_order() {
        for (i, dir) in FaceDir::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
        }
    }

    // Tests inversion negates the normal and is its own inverse
    // Verified by mapping Up to Forward in inverted
    #[test]
    fn test_inverted_negates_forward() {
        for dir in FaceDir::ALL {
            assert_eq!(dir.inverted().forward(), sub([0, 0, 0], dir.forward()));
            assert_eq!(dir.inverted().inverted(), dir);
        }
    }

    // Tests each face frame is orthonormal with right = forward x up
    // Verified by returning +Y as the up vector of top faces
    #[test]
    fn test_face_frames_are_orthogonal() {
        for dir in FaceDir::ALL {
            let (f, u, r) = (dir.forward(), dir.up(), dir.right());
            assert_eq!(dot(f, u), 0, "{dir}");
            assert_eq!(dot(f, r), 0, "{dir}");
            assert_eq!(dot(u, r), 0, "{dir}");
            assert_eq!(r, cross(f, u));
        }
    }

    // Tests touching faces share up and have opposite right vectors
    // Verified by computing right as up x forward for negative faces
    #[test]
    fn test_opposite_faces_mirror_right() {
        for dir in FaceDir::POSITIVE {
            let other = dir.inverted();
            assert_eq!(dir.up(), other.up());
            assert_eq!(dir.right(), sub([0, 0, 0], other.right()));
        }
    }

    // Tests unit vectors map back to their direction and others are rejected
    // Verified by accepting any vector with one non-zero component
    #[test]
    fn test_from_vector() {
        for dir in FaceDir::ALL {
            assert_eq!(FaceDir::from_vector(dir.forward()), Some(dir));
        }
        assert_eq!(FaceDir::from_vector([2, 0, 0]), None);
        assert_eq!(FaceDir::from_vector([1, 1, 0]), None);
        assert_eq!(FaceDir::from_vector([0, 0, 0]), None);
    }

    // Tests the vector helpers
    // Verified by swapping operands in sub
    #[test]
    fn test_vector_arithmetic() {
        assert_eq!(add([1, 2, 3], [4, 5, 6]), [5, 7, 9]);
        assert_eq!(sub([1, 2, 3], [4, 5, 6]), [-3, -3, -3]);
        assert_eq!(dot([1, 2, 3], [4, 5, 6]), 32);
        assert_eq!(cross([1, 0, 0], [0, 1, 0]), [0, 0, 1]);
    }

    // Tests positive directions point along positive axes
    // Verified by listing Left in POSITIVE
    #[test]
    fn test_positive_directions() {
        for dir in FaceDir::POSITIVE {
            assert_eq!(dir.forward().iter().sum::<i32>(), 1);
        }
        assert_eq!(FaceDir::Back.to_string(), "back");
    }
}
