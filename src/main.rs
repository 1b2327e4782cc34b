//! CLI entry point for greedy photo-mosaic assembly

use clap::Parser;
use greedymosaic::io::cli::{Cli, FileProcessor};
use greedymosaic::io::logging::init_logging;

fn main() -> greedymosaic::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    let mut processor = FileProcessor::new(cli);
    processor.process()
}
