//! Rendering-layer entities.
//!
//! [`GalleryImage`] and [`Category`] are what the HTML renderer consumes:
//! scan results merged with YAML metadata and thumbnail records. Both are
//! validated at construction so the renderer never has to re-check.

use crate::thumbnails::ThumbnailRecord;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("image filename must not be empty")]
    EmptyFilename,
    #[error("category name must not be empty")]
    EmptyCategoryName,
    #[error("image {0} has an empty category")]
    EmptyImageCategory(String),
}

/// One image as the renderer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryImage {
    pub filename: String,
    pub source_path: PathBuf,
    pub category: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<ThumbnailRecord>,
}

impl GalleryImage {
    pub fn new(
        filename: impl Into<String>,
        source_path: PathBuf,
        category: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let filename = filename.into();
        let category = category.into();
        if filename.trim().is_empty() {
            return Err(ModelError::EmptyFilename);
        }
        if category.trim().is_empty() {
            return Err(ModelError::EmptyImageCategory(filename));
        }
        Ok(Self {
            filename,
            source_path,
            category,
            title: None,
            description: None,
            width: None,
            height: None,
            thumbnail: None,
        })
    }

    /// Alt text for the `<img>` tag: the explicit title when present,
    /// otherwise the filename stem with separators turned into spaces and
    /// each word capitalized (`summer-trip_02.jpg` reads "Summer Trip 02").
    pub fn alt_text(&self) -> String {
        if let Some(title) = &self.title
            && !title.trim().is_empty()
        {
            return title.clone();
        }
        let stem = self
            .filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem);
        stem.split(['-', '_'])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A named group of images in declared display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub order: usize,
    pub images: Vec<GalleryImage>,
}

impl Category {
    pub fn new(name: impl Into<String>, order: usize) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyCategoryName);
        }
        Ok(Self {
            name,
            order,
            images: Vec::new(),
        })
    }

    /// Append an image. Assembler bug, not recoverable data, if the
    /// category names disagree.
    pub fn add_image(&mut self, image: GalleryImage) {
        debug_assert_eq!(image.category, self.name);
        self.images.push(image);
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
