//! COCO format data structures.
//!
//! Field sets, ordering and null-ness match the document produced by the
//! classic LabelMe exporters: nullable metadata is `Option` serialized as
//! JSON `null`, never omitted.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// COCO dataset information block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub description: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub year: i32,
    pub contributor: Option<String>,
    pub date_created: String,
}

impl Default for Info {
    fn default() -> Self {
        let now = Local::now();
        Self {
            description: None,
            url: None,
            version: None,
            year: now.year(),
            contributor: None,
            date_created: now.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }
}

/// COCO license entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct License {
    pub url: Option<String>,
    pub id: u32,
    pub name: Option<String>,
}

/// COCO image entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub license: u32,
    pub url: Option<String>,
    /// Path of the copied image, relative to the annotations file.
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    pub date_captured: Option<String>,
    pub id: u32,
}

impl Image {
    pub fn new(id: u32, file_name: String, height: u32, width: u32) -> Self {
        Self {
            license: 0,
            url: None,
            file_name,
            height,
            width,
            date_captured: None,
            id,
        }
    }
}

/// COCO instance annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub category_id: u32,
    /// One flattened `[x0, y0, x1, y1, ...]` list per polygon.
    pub segmentation: Vec<Vec<f64>>,
    pub area: f64,
    pub bbox: [f64; 4],
    pub iscrowd: u32,
}

/// COCO category entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub supercategory: Option<String>,
    pub id: u32,
    pub name: String,
}

/// The aggregate dataset document, serialized exactly once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoFile {
    pub info: Info,
    pub licenses: Vec<License>,
    pub images: Vec<Image>,
    #[serde(rename = "type")]
    pub dataset_type: String,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

impl CocoFile {
    /// An empty instance-segmentation document with the given categories.
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            info: Info::default(),
            licenses: vec![License::default()],
            images: Vec::new(),
            dataset_type: "instances".to_string(),
            annotations: Vec::new(),
            categories,
        }
    }
}
