//! Tests for candidate minimum dimensions and registry signing

#[cfg(test)]
mod tests {
    use greedymosaic::MosaicError;
    use greedymosaic::analysis::candidates::{
        CandidateEntry, CandidateImage, CandidateRegistry, minimum_dimensions,
    };
    use greedymosaic::analysis::signature::Signature;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn entry(name: &str, width: u32, height: u32) -> CandidateEntry {
        CandidateEntry::new(PathBuf::from(name), width, height)
    }

    // Tests widths and heights are minimised independently
    // Verified by taking both dimensions from the smallest-area candidate
    #[test]
    fn test_minimum_dimensions_independent() {
        let entries = vec![entry("a", 120, 50), entry("b", 60, 200), entry("c", 90, 90)];

        assert!(matches!(minimum_dimensions(&entries), Ok((60, 50))));
    }

    // Tests empty sets and zero-sized candidates are rejected
    // Verified by defaulting the minimum to zero
    #[test]
    fn test_minimum_dimensions_errors() {
        assert!(matches!(
            minimum_dimensions(&[]),
            Err(MosaicError::NoCandidates { .. })
        ));
        assert!(matches!(
            minimum_dimensions(&[entry("a", 10, 10), entry("b", 0, 10)]),
            Err(MosaicError::NoCandidates { .. })
        ));
    }

    // Tests candidates are signed over the tile crop only, in index order
    // Verified by signing the whole candidate image
    #[test]
    fn test_sign_uses_tile_crop() {
        let mut striped = RgbImage::new(4, 4);
        for y in 0..4 {
            for x in 0..2 {
                striped.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let images = [striped, RgbImage::from_pixel(4, 4, Rgb([30, 60, 90]))];
        let entries = vec![entry("striped", 4, 4), entry("flat", 4, 4)];

        let result = CandidateRegistry::sign(&entries, 2, 2, |index, _| {
            images.get(index).cloned().ok_or(MosaicError::InvalidCandidateIndex {
                index,
                candidate_count: 2,
            })
        });
        let Ok(registry) = result else {
            unreachable!("Signing should succeed");
        };

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.get(0).map(|c| c.signature.channels()),
            Some([255.0, 255.0, 255.0])
        );
        assert_eq!(
            registry.get(1).map(|c| c.signature.channels()),
            Some([30.0, 60.0, 90.0])
        );
        assert_eq!(
            registry.iter().map(|c| c.source.clone()).collect::<Vec<_>>(),
            vec![PathBuf::from("striped"), PathBuf::from("flat")]
        );
    }

    // Tests a failing load aborts signing
    // Verified by skipping candidates that fail to load
    #[test]
    fn test_sign_propagates_load_failure() {
        let entries = vec![entry("a", 4, 4), entry("b", 4, 4)];

        let result = CandidateRegistry::sign(&entries, 2, 2, |index, _| {
            if index == 1 {
                Err(MosaicError::InvalidCandidateIndex {
                    index,
                    candidate_count: 1,
                })
            } else {
                Ok(RgbImage::new(4, 4))
            }
        });

        assert!(matches!(
            result,
            Err(MosaicError::InvalidCandidateIndex { index: 1, .. })
        ));
    }

    // Tests a registry cannot be empty
    // Verified by removing the empty check
    #[test]
    fn test_from_images() {
        assert!(matches!(
            CandidateRegistry::from_images(Vec::new()),
            Err(MosaicError::NoCandidates { .. })
        ));

        let image = CandidateImage {
            source: PathBuf::from("one"),
            width: 8,
            height: 8,
            signature: Signature::new(1.0, 2.0, 3.0),
        };
        let Ok(registry) = CandidateRegistry::from_images(vec![image]) else {
            unreachable!("Registry should build");
        };
        assert_eq!(registry.len(), 1);
        assert!(registry.get(1).is_none());
    }
}
