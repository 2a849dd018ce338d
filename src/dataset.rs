//! Dataset assembly: walks the annotation directory, copies images into
//! the output tree and builds the aggregate COCO document.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use glob::glob;
use log::{debug, info};

use crate::categories::{self, LabelTable};
use crate::coco::{Annotation, CocoFile, Image};
use crate::error::{Error, Result};
use crate::labelme;
use crate::mask;
use crate::rle;
use crate::utils::create_progress_bar;

/// Subdirectory of the output tree that receives the copied images.
const IMAGES_SUBDIR: &str = "JPEGImages";

/// Name of the aggregate document written at the output root.
const ANNOTATIONS_FILE: &str = "annotations.json";

/// Paths of the freshly created output tree.
#[derive(Debug)]
pub struct OutputLayout {
    pub images_dir: PathBuf,
    pub annotations_path: PathBuf,
}

/// Create the output directory structure, refusing to touch a pre-existing
/// directory.
pub fn setup_output_directories(output_dir: &Path) -> Result<OutputLayout> {
    if output_dir.exists() {
        return Err(Error::OutputExists(output_dir.to_path_buf()));
    }
    let images_dir = output_dir.join(IMAGES_SUBDIR);
    fs::create_dir_all(&images_dir).map_err(|source| Error::io(&images_dir, source))?;
    Ok(OutputLayout {
        images_dir,
        annotations_path: output_dir.join(ANNOTATIONS_FILE),
    })
}

/// Collect the annotation files under `input_dir`, sorted lexicographically
/// so image and annotation ids are reproducible across platforms.
pub fn discover_annotation_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = input_dir.join("*.xml");
    let mut files: Vec<PathBuf> = glob(&pattern.to_string_lossy())
        .map_err(|e| {
            Error::io(
                input_dir,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })?
        .filter_map(|entry| entry.ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Run the full conversion pipeline.
pub fn convert(input_dir: &Path, output_dir: &Path, labels_path: &Path) -> Result<()> {
    let layout = setup_output_directories(output_dir)?;
    let labels = categories::load_labels(labels_path)?;
    let files = discover_annotation_files(input_dir)?;

    let mut doc = CocoFile::new(labels.categories.clone());

    let pb = create_progress_bar(files.len() as u64, "Convert");
    for (image_id, label_path) in files.iter().enumerate() {
        debug!("generating dataset from: {}", label_path.display());
        process_label_file(label_path, image_id as u32, &layout, &labels, &mut doc)
            .map_err(|e| e.in_file(label_path))?;
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");

    info!(
        "writing {} images and {} annotations to {}",
        doc.images.len(),
        doc.annotations.len(),
        layout.annotations_path.display()
    );
    let file = File::create(&layout.annotations_path)
        .map_err(|source| Error::io(&layout.annotations_path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &doc)?;

    Ok(())
}

/// Process one annotation file: copy its image out, then append one image
/// record and one annotation record per recognized object.
fn process_label_file(
    label_path: &Path,
    image_id: u32,
    layout: &OutputLayout,
    labels: &LabelTable,
    doc: &mut CocoFile,
) -> Result<()> {
    let parsed = labelme::parse_file(label_path)?;

    let image_src = label_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&parsed.filename);
    let (file_name, height, width) = copy_image(&image_src, &layout.images_dir)?;

    for object in &parsed.objects {
        let Some(&category_id) = labels.name_to_id.get(&object.name) else {
            debug!("skipping object with unknown label: {}", object.name);
            continue;
        };

        let mask = mask::rasterize(height, width, &object.points);
        let encoded = rle::encode(&mask, height, width)?;
        let (area, bbox) = rle::area_and_bbox(&encoded);

        let flattened: Vec<f64> = object.points.iter().flat_map(|&(x, y)| [x, y]).collect();
        doc.annotations.push(Annotation {
            id: doc.annotations.len() as u32,
            image_id,
            category_id,
            segmentation: vec![flattened],
            area,
            bbox,
            iscrowd: 0,
        });
    }

    doc.images.push(Image::new(image_id, file_name, height, width));
    Ok(())
}

/// Decode the source image, re-encode it as RGB into the output tree and
/// return the document-relative file name with the true pixel dimensions.
fn copy_image(image_src: &Path, images_dir: &Path) -> Result<(String, u32, u32)> {
    let decoded = image::open(image_src).map_err(|source| Error::Image {
        path: image_src.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let basename = image_src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let out_name = sanitize_filename::sanitize(basename);
    let out_path = images_dir.join(&out_name);
    rgb.save(&out_path).map_err(|source| Error::Image {
        path: out_path.clone(),
        source,
    })?;

    Ok((format!("{}/{}", IMAGES_SUBDIR, out_name), height, width))
}
