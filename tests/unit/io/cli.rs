//! Tests for command-line interface parsing and file processing

#[cfg(test)]
mod tests {
    use clap::Parser;
    use greedymosaic::MosaicError;
    use greedymosaic::algorithm::fitting::{ExhaustionPolicy, FitMode};
    use greedymosaic::algorithm::ranking::DistanceMetric;
    use greedymosaic::io::cli::{Cli, FileProcessor, FitStrategy};
    use greedymosaic::io::configuration::{
        DEFAULT_EXCLUSION_RADIUS, DEFAULT_GRID_SIZE, DEFAULT_REPEAT_CAP,
    };
    use greedymosaic::io::logging::Verbosity;
    use image::{Rgb, RgbImage};
    use std::path::{Path, PathBuf};

    const GRAYS: [u8; 4] = [0, 60, 120, 240];

    fn write_png(path: &Path, img: &RgbImage) {
        assert!(img.save(path).is_ok(), "Fixture {} should save", path.display());
    }

    /// Reference with one gray per quadrant plus a candidate directory of
    /// matching solid tiles
    fn fixture(root: &Path) -> (PathBuf, PathBuf) {
        let reference = root.join("scene.png");
        write_png(
            &reference,
            &RgbImage::from_fn(80, 80, |x, y| {
                let quadrant = usize::from(y >= 40) * 2 + usize::from(x >= 40);
                let value = GRAYS.get(quadrant).copied().unwrap_or(0);
                Rgb([value, value, value])
            }),
        );

        let tiles = root.join("tiles");
        assert!(std::fs::create_dir_all(&tiles).is_ok());
        for value in GRAYS {
            write_png(
                &tiles.join(format!("gray_{value:03}.png")),
                &RgbImage::from_pixel(40, 40, Rgb([value, value, value])),
            );
        }

        (reference, tiles)
    }

    fn path_arg(path: &Path) -> String {
        path.display().to_string()
    }

    // Tests CLI parsing with only the required arguments
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["program", "photo.png", "--candidates", "tiles"]);

        assert_eq!(cli.target, PathBuf::from("photo.png"));
        assert_eq!(cli.candidates, PathBuf::from("tiles"));
        assert_eq!(cli.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(cli.repeat_cap, DEFAULT_REPEAT_CAP);
        assert_eq!(cli.fit_mode, FitStrategy::Sparse);
        assert_eq!(cli.exhaustion, ExhaustionPolicy::RelaxSpatialThenCap);
        assert_eq!(cli.metric, DistanceMetric::SignedSum);
        assert!(!cli.no_filter);
        assert!(!cli.quiet);
        assert!(cli.output_dir.is_none());
    }

    // Tests CLI parsing with every option set
    // Verified by modifying value enum names
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "program",
            "photos",
            "--candidates",
            "tiles",
            "--output-dir",
            "out",
            "--grid-size",
            "8",
            "--tolerance",
            "0.05",
            "--repeat-cap",
            "2",
            "--fit-mode",
            "best-pick",
            "--exclusion-radius",
            "3",
            "--exhaustion",
            "fail",
            "--metric",
            "euclidean",
            "--no-filter",
            "--filter-strength",
            "0.25",
            "--signatures",
            "--table",
            "--verbose",
            "--no-skip",
        ]);

        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.grid_size, 8);
        assert!((cli.tolerance - 0.05).abs() < f32::EPSILON);
        assert_eq!(cli.repeat_cap, 2);
        assert_eq!(cli.fit_mode, FitStrategy::BestPick);
        assert_eq!(cli.exclusion_radius, 3);
        assert_eq!(cli.exhaustion, ExhaustionPolicy::Fail);
        assert_eq!(cli.metric, DistanceMetric::Euclidean);
        assert!(cli.no_filter);
        assert!((cli.filter_strength - 0.25).abs() < f64::EPSILON);
        assert!(cli.signatures);
        assert!(cli.table);
        assert_eq!(cli.verbosity(), Verbosity::Verbose);
        assert!(!cli.skip_existing());
    }

    // Tests short flag parsing
    // Verified by changing short flag definitions
    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "program", "a.png", "-c", "t", "-g", "12", "-r", "3", "-d", "4", "-q",
        ]);

        assert_eq!(cli.grid_size, 12);
        assert_eq!(cli.repeat_cap, 3);
        assert_eq!(cli.exclusion_radius, 4);
        assert!(!cli.should_show_progress());
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }

    // Tests the fit mode carries the exclusion radius only in sparse mode
    // Verified by always returning sparse mode
    #[test]
    fn test_fit_mode_mapping() {
        let sparse = Cli::parse_from(["program", "a.png", "-c", "t"]);
        assert_eq!(
            sparse.fit_mode(),
            FitMode::Sparse {
                exclusion_radius: DEFAULT_EXCLUSION_RADIUS
            }
        );

        let best = Cli::parse_from(["program", "a.png", "-c", "t", "-m", "best-pick"]);
        assert_eq!(best.fit_mode(), FitMode::BestPick);
    }

    // Tests the engine configuration mirrors the flags
    // Verified by inverting the filter flag
    #[test]
    fn test_mosaic_config() {
        let cli = Cli::parse_from(["program", "a.png", "-c", "t", "--no-filter", "-g", "6"]);
        let config = cli.mosaic_config();

        assert_eq!(config.grid_size, 6);
        assert!(!config.filter_enabled);
        assert_eq!(config.exhaustion_policy, ExhaustionPolicy::default());
        assert!(config.validate().is_ok());
    }

    // Tests the candidate directory is required
    // Verified by making the option optional
    #[test]
    fn test_candidates_required() {
        assert!(Cli::try_parse_from(["program", "a.png"]).is_err());
    }

    // Tests output paths sit beside the reference unless redirected
    // Verified by dropping the original extension
    #[test]
    fn test_output_paths() {
        let beside = FileProcessor::new(Cli::parse_from(["program", "dir/a.jpg", "-c", "t", "-q"]));
        assert_eq!(
            beside.output_path(Path::new("dir/a.jpg")),
            PathBuf::from("dir/a_mosaic.jpg")
        );

        let redirected = FileProcessor::new(Cli::parse_from([
            "program", "dir/a.jpg", "-c", "t", "-q", "-o", "out",
        ]));
        assert_eq!(
            redirected.output_path(Path::new("dir/a.jpg")),
            PathBuf::from("out/a_mosaic.jpg")
        );
    }

    // Tests directory targets skip generated outputs and sort references
    // Verified by including files with the output suffix
    #[test]
    fn test_collect_files_directory() {
        let Ok(dir) = tempfile::tempdir() else {
            unreachable!("Temp dir should be created");
        };
        let small = RgbImage::new(2, 2);
        write_png(&dir.path().join("b.png"), &small);
        write_png(&dir.path().join("a.png"), &small);
        write_png(&dir.path().join("a_mosaic.png"), &small);
        write_png(&dir.path().join("a_signatures.png"), &small);

        let processor = FileProcessor::new(Cli::parse_from([
            "program".to_string(),
            path_arg(dir.path()),
            "-c".to_string(),
            "t".to_string(),
            "-q".to_string(),
            "--no-skip".to_string(),
        ]));
        let Ok(files) = processor.collect_files() else {
            unreachable!("Collection should succeed");
        };
        assert_eq!(files, vec![dir.path().join("a.png"), dir.path().join("b.png")]);

        let skipping = FileProcessor::new(Cli::parse_from([
            "program".to_string(),
            path_arg(dir.path()),
            "-c".to_string(),
            "t".to_string(),
            "-q".to_string(),
        ]));
        let Ok(remaining) = skipping.collect_files() else {
            unreachable!("Collection should succeed");
        };
        assert_eq!(remaining, vec![dir.path().join("b.png")]);
    }

    // Tests missing and unsupported targets are rejected
    // Verified by treating any path as a reference
    #[test]
    fn test_collect_files_invalid_target() {
        let Ok(dir) = tempfile::tempdir() else {
            unreachable!("Temp dir should be created");
        };
        let notes = dir.path().join("notes.txt");
        assert!(std::fs::write(&notes, "text").is_ok());

        for target in [notes, dir.path().join("missing.png")] {
            let processor = FileProcessor::new(Cli::parse_from([
                "program".to_string(),
                path_arg(&target),
                "-c".to_string(),
                "t".to_string(),
                "-q".to_string(),
            ]));
            assert!(matches!(
                processor.collect_files(),
                Err(MosaicError::InvalidReferenceImage { .. })
            ));
        }
    }

    // Tests a full run writes the mosaic, preview and table
    // Verified by disabling the optional exports
    #[test]
    fn test_process_writes_outputs() {
        let Ok(dir) = tempfile::tempdir() else {
            unreachable!("Temp dir should be created");
        };
        let (reference, tiles) = fixture(dir.path());

        let mut processor = FileProcessor::new(Cli::parse_from([
            "program".to_string(),
            path_arg(&reference),
            "-c".to_string(),
            path_arg(&tiles),
            "-g".to_string(),
            "4".to_string(),
            "-r".to_string(),
            "4".to_string(),
            "-m".to_string(),
            "best-pick".to_string(),
            "--no-filter".to_string(),
            "--signatures".to_string(),
            "--table".to_string(),
            "-q".to_string(),
        ]));

        assert!(processor.process().is_ok());

        let mosaic_path = dir.path().join("scene_mosaic.png");
        let Ok(mosaic) = image::open(&mosaic_path) else {
            unreachable!("Mosaic should be written");
        };
        let mosaic = mosaic.to_rgb8();
        assert_eq!(mosaic.dimensions(), (160, 160));
        assert_eq!(mosaic.get_pixel(10, 10).0, [0, 0, 0]);
        assert_eq!(mosaic.get_pixel(150, 150).0, [240, 240, 240]);

        assert!(dir.path().join("scene_signatures.png").exists());
        assert!(dir.path().join("scene_assignments.json").exists());
    }

    // Tests an existing mosaic short-circuits processing
    // Verified by ignoring the skip flag
    #[test]
    fn test_process_skips_existing_output() {
        let Ok(dir) = tempfile::tempdir() else {
            unreachable!("Temp dir should be created");
        };
        let (reference, _) = fixture(dir.path());
        write_png(&dir.path().join("scene_mosaic.png"), &RgbImage::new(1, 1));

        // The candidate directory is never read when nothing needs processing
        let mut processor = FileProcessor::new(Cli::parse_from([
            "program".to_string(),
            path_arg(&reference),
            "-c".to_string(),
            path_arg(&dir.path().join("no_tiles_here")),
            "-q".to_string(),
        ]));

        assert!(processor.process().is_ok());
    }
}
