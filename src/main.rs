use clap::Parser;
use log::{error, info};

use xml2coco::{convert, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Creating dataset: {}", args.output_dir.display());

    if let Err(e) = convert(&args.input_dir, &args.output_dir, &args.labels) {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Conversion process completed successfully.");
}
