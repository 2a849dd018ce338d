use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for converting annotated XML directories to a
/// COCO dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input directory of annotated XML files
    pub input_dir: PathBuf,

    /// Output dataset directory (must not exist yet)
    pub output_dir: PathBuf,

    /// Labels file, one class name per line, first line `__ignore__`
    #[arg(long = "labels")]
    pub labels: PathBuf,
}
