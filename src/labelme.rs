//! Parsing of LabelMe-style XML annotation files.
//!
//! Each file describes one image: a `<filename>` element plus zero or more
//! `<object>` elements, every object carrying a `<name>` label and a
//! `<polygon>` of `<pt>` points with `<x>`/`<y>` text content. Field-count
//! violations are fatal; extra elements the tool does not use are ignored.

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::{Error, Result};

/// One annotated object: a label and its polygon outline.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// The parsed contents of one annotation file.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFile {
    /// Image file name, relative to the annotation file's directory.
    pub filename: String,
    pub objects: Vec<ObjectRecord>,
}

/// Parse an annotation file from disk.
pub fn parse_file(path: &Path) -> Result<LabelFile> {
    let text = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
    parse_document(&text).map_err(|e| match e {
        Error::Xml { source, .. } => Error::Xml {
            path: path.to_path_buf(),
            source,
        },
        e => e.in_file(path),
    })
}

/// Parse an annotation document from a string.
pub fn parse_document(text: &str) -> Result<LabelFile> {
    let doc = Document::parse(text).map_err(|source| Error::Xml {
        path: Default::default(),
        source,
    })?;
    let root = doc.root_element();

    let filename = text_of(find_one(root, "filename")?);
    let mut objects = Vec::new();
    for object in root.children().filter(|c| c.has_tag_name("object")) {
        objects.push(parse_object(object)?);
    }

    Ok(LabelFile { filename, objects })
}

fn parse_object(object: Node) -> Result<ObjectRecord> {
    let name = text_of(find_one(object, "name")?);
    let polygon = find_one(object, "polygon")?;

    let pts: Vec<Node> = polygon.children().filter(|c| c.has_tag_name("pt")).collect();
    if pts.is_empty() {
        return Err(Error::MissingField {
            field: "pt".into(),
            context: "polygon".into(),
        });
    }

    let mut points = Vec::with_capacity(pts.len());
    for pt in pts {
        let x = number_of(find_one(pt, "x")?)?;
        let y = number_of(find_one(pt, "y")?)?;
        points.push((x, y));
    }

    Ok(ObjectRecord { name, points })
}

/// Find exactly one direct child with the given tag name.
fn find_one<'a>(parent: Node<'a, 'a>, name: &str) -> Result<Node<'a, 'a>> {
    let mut matches = parent.children().filter(|c| c.has_tag_name(name));
    let first = matches.next().ok_or_else(|| Error::MissingField {
        field: name.into(),
        context: parent.tag_name().name().into(),
    })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(Error::FieldCount {
            field: name.into(),
            context: parent.tag_name().name().into(),
            expected: 1,
            found: extra + 1,
        });
    }
    Ok(first)
}

fn text_of(node: Node) -> String {
    node.text().map(str::trim).unwrap_or_default().to_string()
}

fn number_of(node: Node) -> Result<f64> {
    let text = text_of(node);
    text.parse().map_err(|_| Error::InvalidNumber {
        value: text,
        context: node.tag_name().name().into(),
    })
}
