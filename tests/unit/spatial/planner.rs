//! Tests for tile crop search, grid planning and cell scoring

#[cfg(test)]
mod tests {
    use greedymosaic::MosaicError;
    use greedymosaic::io::configuration::MIN_TILE_DIMENSION;
    use greedymosaic::spatial::pixels::Region;
    use greedymosaic::spatial::planner::{
        CropAxis, crop_tile, plan_grid, plan_mosaic, score_cells,
    };
    use image::{Rgb, RgbImage};

    // Tests a wide candidate has its width scanned down to the reference aspect
    // Verified by scanning the height instead
    #[test]
    fn test_crop_tile_width_axis() {
        let crop = crop_tile((400, 400), (100, 80), 0.01);
        assert!(matches!(crop, Ok((80, 80, CropAxis::Width))));
    }

    // Tests a narrow candidate has its height scanned down to the reference aspect
    // Verified by comparing aspects with the wrong inequality
    #[test]
    fn test_crop_tile_height_axis() {
        let crop = crop_tile((400, 200), (100, 100), 0.01);
        assert!(matches!(crop, Ok((100, 50, CropAxis::Height))));
    }

    // Tests the first dimension within tolerance wins, scanning downward
    // Verified by scanning upward from one pixel
    #[test]
    fn test_crop_tile_first_match_wins() {
        // 60/40 = 1.5 exactly, but 61/40 = 1.525 is already within 0.05
        let crop = crop_tile((300, 200), (61, 40), 0.05);
        assert!(matches!(crop, Ok((61, 40, CropAxis::Width))));

        let exact = crop_tile((300, 200), (90, 90), 0.0);
        assert!(matches!(exact, Ok((90, 60, CropAxis::Height))));
    }

    // Tests matching aspects need no crop at all
    // Verified by starting the scan one pixel below the minimum
    #[test]
    fn test_crop_tile_equal_aspect() {
        let crop = crop_tile((640, 480), (64, 48), 0.01);
        assert!(matches!(crop, Ok((64, 48, CropAxis::Width))));
    }

    // Tests the scan gives up at the floor and reports the attempted bound
    // Verified by removing the floor check
    #[test]
    fn test_crop_tile_unreachable() {
        let crop = crop_tile((1000, 10), (100, 100), 0.01);
        match crop {
            Err(MosaicError::AspectRatioUnreachable {
                last_tested,
                reference_aspect,
                ..
            }) => {
                assert_eq!(last_tested, MIN_TILE_DIMENSION);
                assert!((reference_aspect - 100.0).abs() < f32::EPSILON);
            }
            other => unreachable!("Expected AspectRatioUnreachable, got {other:?}"),
        }
    }

    // Tests zero-sized inputs are rejected before scanning
    // Verified by dividing by the zero height
    #[test]
    fn test_crop_tile_zero_dimensions() {
        assert!(matches!(
            crop_tile((0, 10), (10, 10), 0.01),
            Err(MosaicError::InvalidReferenceImage { .. })
        ));
        assert!(matches!(
            crop_tile((10, 10), (10, 0), 0.01),
            Err(MosaicError::InvalidParameter { .. })
        ));
    }

    // Tests mosaic dimensions are exact multiples of the tile size
    // Verified by deriving mosaic size from the reference instead
    #[test]
    fn test_plan_grid_mosaic_multiples() {
        let cases = [
            ((400, 400), (100, 80), 4),
            ((403, 401), (100, 80), 7),
            ((1024, 768), (120, 90), 40),
            ((300, 200), (90, 90), 3),
        ];

        for (reference, min_candidate, n) in cases {
            let Ok(plan) = plan_grid(reference, min_candidate, n, 0.01) else {
                unreachable!("Plan should succeed for {reference:?}");
            };
            assert_eq!(plan.mosaic_width, plan.tile_width * n as u32);
            assert_eq!(plan.mosaic_height, plan.tile_height * n as u32);
            assert_eq!(plan.rows, n);
            assert_eq!(plan.cols, n);
            assert_eq!(plan.cell_count(), n * n);
        }
    }

    // Tests identical inputs produce identical plans and sample regions
    // Verified by rounding strides instead of truncating
    #[test]
    fn test_plan_grid_deterministic() {
        let first = plan_grid((403, 401), (100, 80), 4, 0.01);
        let second = plan_grid((403, 401), (100, 80), 4, 0.01);

        let (Ok(first), Ok(second)) = (first, second) else {
            unreachable!("Plan should succeed");
        };
        assert_eq!(first, second);
        assert_eq!((first.stride_x, first.stride_y), (100, 100));
        assert_eq!(first.sample_region(3, 3), Region::new(300, 300, 100, 100));
        assert_eq!((first.tile_width, first.tile_height), (81, 80));
        assert_eq!(first.tile_offset(2, 1), (81, 160));
    }

    // Tests grid size and tolerance bounds
    // Verified by accepting a zero grid size
    #[test]
    fn test_plan_grid_rejects_bad_parameters() {
        assert!(matches!(
            plan_grid((400, 400), (100, 100), 0, 0.01),
            Err(MosaicError::InvalidParameter {
                parameter: "grid_size",
                ..
            })
        ));
        assert!(matches!(
            plan_grid((400, 400), (100, 100), 4, -0.5),
            Err(MosaicError::InvalidParameter {
                parameter: "aspect_tolerance",
                ..
            })
        ));
        assert!(matches!(
            plan_grid((400, 400), (100, 100), 4, f32::NAN),
            Err(MosaicError::InvalidParameter { .. })
        ));
    }

    // Tests a reference smaller than the grid cannot be partitioned
    // Verified by allowing zero strides
    #[test]
    fn test_plan_grid_reference_too_small() {
        assert!(matches!(
            plan_grid((3, 30), (40, 40), 4, 0.01),
            Err(MosaicError::InvalidReferenceImage { .. })
        ));
    }

    // Tests remainder pixels on the right and bottom edges are never scored
    // Verified by spreading the remainder across cells
    #[test]
    fn test_score_cells_excludes_remainder() {
        let mut reference = RgbImage::new(9, 9);
        for i in 0..9 {
            reference.put_pixel(8, i, Rgb([255, 255, 255]));
            reference.put_pixel(i, 8, Rgb([255, 255, 255]));
        }

        let Ok(plan) = plan_grid((9, 9), (40, 40), 2, 0.01) else {
            unreachable!("Plan should succeed");
        };
        let Ok(cells) = score_cells(&plan, &reference) else {
            unreachable!("Scoring should succeed");
        };

        assert_eq!(cells.len(), 4);
        for cell in &cells {
            assert_eq!(cell.target.channels(), [0.0, 0.0, 0.0]);
        }
    }

    // Tests cells come back in row-major order with their own targets
    // Verified by scoring with the tile size instead of the stride
    #[test]
    fn test_plan_mosaic_row_major_targets() {
        let mut reference = RgbImage::new(20, 20);
        for y in 0..20 {
            for x in 10..20 {
                reference.put_pixel(x, y, Rgb([100, 0, 0]));
            }
        }

        let Ok(planned) = plan_mosaic(&reference, (40, 40), 2, 0.01) else {
            unreachable!("Planning should succeed");
        };

        let indices: Vec<usize> = planned.cells.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let reds: Vec<f64> = planned.cells.iter().map(|c| c.target.red()).collect();
        assert_eq!(reds, vec![0.0, 100.0, 0.0, 100.0]);

        assert!(planned.cells.iter().all(|c| c.assigned.is_none()));
        assert!(planned.cells.iter().all(|c| c.size == (40, 40)));
    }
}
