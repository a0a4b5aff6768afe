//! Gallery assembly and HTML generation.
//!
//! Two stages share this module. [`organize_by_category`] merges scan
//! results, YAML metadata, and thumbnail records into renderable
//! [`Category`] structures in declared order. [`generate`] renders the
//! single gallery page with [maud](https://maud.lambda.xyz/) and writes it
//! alongside cache-busted CSS/JS bundles and lightbox-sized originals.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── assets/
//! │   ├── gallery.1a2b3c4d.css
//! │   └── gallery.5e6f7a8b.js
//! └── images/
//!     ├── thumbnails/            # Written by the thumbnail pipeline
//!     │   ├── sunset-9c0d1e2f.webp
//!     │   └── sunset-9c0d1e2f.jpg
//!     └── originals/             # Lightbox targets
//!         └── sunset.9c0d1e2f.jpg
//! ```
//!
//! Rendering is deterministic: the page carries no timestamps, so an
//! unchanged gallery re-renders byte-identically and the hashed asset
//! names stay stable.

use crate::assets;
use crate::model::{Category, GalleryImage};
use crate::thumbnails::ThumbnailRecord;
use crate::yaml_sync::{GalleryFile, entry_map};
use maud::{DOCTYPE, Markup, html};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Subdirectory of the output directory holding hashed CSS/JS bundles.
pub const ASSETS_SUBDIR: &str = "assets";
/// Subdirectory the thumbnail pipeline writes into.
pub const THUMBNAILS_SUBDIR: &str = "images/thumbnails";
/// Subdirectory holding full-size lightbox copies.
pub const ORIGINALS_SUBDIR: &str = "images/originals";

const CSS: &str = include_str!("../static/gallery.css");
const JS: &str = include_str!("../static/gallery.js");

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Assembly
// ============================================================================

/// Merge scanned sources, YAML entries, and thumbnail records into
/// categories in declared display order.
///
/// Per-image problems degrade instead of failing the build: an image whose
/// category is not declared is logged and skipped, an image without a YAML
/// entry falls back to the default category with no title.
pub fn organize_by_category(
    gallery: &GalleryFile,
    scanned: &[PathBuf],
    thumbnails: &HashMap<PathBuf, ThumbnailRecord>,
    default_category: &str,
) -> Vec<Category> {
    let entries = entry_map(gallery);
    let mut categories: Vec<Category> = gallery
        .categories
        .iter()
        .enumerate()
        .filter_map(|(order, name)| match Category::new(name.clone(), order) {
            Ok(category) => Some(category),
            Err(err) => {
                warn!("skipping category: {err}");
                None
            }
        })
        .collect();
    let index: HashMap<String, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.clone(), i))
        .collect();

    for source in scanned {
        let Some(filename) = source.file_name().and_then(|n| n.to_str()) else {
            warn!("skipping source with unusable name: {}", source.display());
            continue;
        };
        let entry = entries.get(filename);
        let category_name = entry.map_or(default_category, |e| e.category.as_str());
        let Some(&slot) = index.get(category_name) else {
            warn!("{filename}: category \"{category_name}\" is not declared, skipping");
            continue;
        };

        let mut image = match GalleryImage::new(filename, source.clone(), category_name) {
            Ok(image) => image,
            Err(err) => {
                warn!("skipping {filename}: {err}");
                continue;
            }
        };
        if let Some(entry) = entry {
            image.title = entry.title.clone();
            image.description = entry.description.clone();
        }
        if let Some(record) = thumbnails.get(source) {
            image.width = Some(record.width);
            image.height = Some(record.height);
            image.thumbnail = Some(record.clone());
        }
        categories[slot].add_image(image);
    }

    categories.retain(|category| !category.is_empty());
    categories
}

// ============================================================================
// Site generation
// ============================================================================

/// Render the gallery page and write it with its hashed assets.
pub fn generate(
    categories: &[Category],
    site_title: &str,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    fs::create_dir_all(output_dir)?;
    let assets_dir = output_dir.join(ASSETS_SUBDIR);
    let css_path = assets::write_with_hash(&assets_dir, "gallery", "css", CSS)?;
    let js_path = assets::write_with_hash(&assets_dir, "gallery", "js", JS)?;

    let originals_dir = output_dir.join(ORIGINALS_SUBDIR);
    let originals = copy_originals(categories, &originals_dir);

    let page = render_page(
        site_title,
        categories,
        &href(ASSETS_SUBDIR, &css_path),
        &href(ASSETS_SUBDIR, &js_path),
        &originals,
    );
    fs::write(output_dir.join("index.html"), page.into_string())?;
    info!("generated index.html ({} categories)", categories.len());
    Ok(())
}

/// Copy each image's source into the originals directory for the lightbox.
/// A failed copy is logged; the image then links to its JPEG thumbnail.
fn copy_originals(categories: &[Category], originals_dir: &Path) -> HashMap<PathBuf, String> {
    let mut hrefs = HashMap::new();
    for image in categories.iter().flat_map(|c| &c.images) {
        match assets::copy_with_hash(&image.source_path, originals_dir) {
            Ok(copied) => {
                hrefs.insert(image.source_path.clone(), href(ORIGINALS_SUBDIR, &copied));
            }
            Err(err) => {
                warn!("cannot copy original {}: {err}", image.source_path.display());
            }
        }
    }
    hrefs
}

/// Site-relative href for a file written into a known subdirectory.
fn href(subdir: &str, path: &Path) -> String {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => format!("{subdir}/{name}"),
        None => String::new(),
    }
}

fn render_page(
    site_title: &str,
    categories: &[Category],
    css_href: &str,
    js_href: &str,
    originals: &HashMap<PathBuf, String>,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (site_title) }
                link rel="stylesheet" href=(css_href);
            }
            body {
                header.site-header {
                    h1 { (site_title) }
                    @if categories.len() > 1 {
                        nav.category-nav {
                            @for category in categories {
                                a href={ "#" (slug(&category.name)) } { (category.name) }
                            }
                        }
                    }
                }
                main {
                    @for category in categories {
                        (render_category(category, originals))
                    }
                }
                script src=(js_href) {}
            }
        }
    }
}

fn render_category(category: &Category, originals: &HashMap<PathBuf, String>) -> Markup {
    html! {
        section.category id=(slug(&category.name)) {
            h2 { (category.name) }
            div.gallery-grid {
                @for image in &category.images {
                    @if let Some(record) = &image.thumbnail {
                        (render_figure(image, record, originals))
                    }
                }
            }
        }
    }
}

fn render_figure(
    image: &GalleryImage,
    record: &ThumbnailRecord,
    originals: &HashMap<PathBuf, String>,
) -> Markup {
    let webp_href = href(THUMBNAILS_SUBDIR, &record.webp_path);
    let jpeg_href = href(THUMBNAILS_SUBDIR, &record.jpeg_path);
    let full_href = originals
        .get(&image.source_path)
        .cloned()
        .unwrap_or_else(|| jpeg_href.clone());
    let alt = image.alt_text();
    // The blurred preview sits behind the real image until it loads
    let placeholder_style = record
        .blur_placeholder
        .as_ref()
        .map(|p| format!("background-image:url('{}')", p.data_url));

    html! {
        figure.gallery-item {
            a.lightbox-link href=(full_href) data-title=(alt) {
                picture style=[placeholder_style] {
                    source srcset=(webp_href) type="image/webp";
                    img src=(jpeg_href)
                        alt=(alt)
                        width=(record.width)
                        height=(record.height)
                        loading="lazy";
                }
            }
            @if image.title.is_some() || image.description.is_some() {
                figcaption {
                    @if let Some(title) = &image.title {
                        span.image-title { (title) }
                    }
                    @if let Some(description) = &image.description {
                        span.image-description { (description) }
                    }
                }
            }
        }
    }
}

/// Anchor-safe id for a category name.
fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
