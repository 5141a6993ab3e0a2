// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Preview references for selected files

use base64::{engine::general_purpose, Engine as _};
use image::ImageReader;
use std::io::Cursor;
use serde::Serialize;

use crate::prediction::SelectedFile;

/// Transient display handle for a selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRef {
    /// Unique `blob:` handle, new for every selection
    pub handle: String,
    pub file_name: String,
    pub mime: String,
    /// Inline `data:` URL usable as an image source
    #[serde(skip)]
    pub data_url: String,
    /// Pixel size, when the bytes decode as an image
    pub dimensions: Option<(u32, u32)>,
}

impl PreviewRef {
    pub fn from_file(file: &SelectedFile) -> Self {
        let mime = file.content_type();
        let data_url = format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(&file.bytes)
        );
        // Header only; the pixels are never decoded
        let dimensions = ImageReader::new(Cursor::new(&file.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        Self {
            handle: format!("blob:predictor/{}", uuid::Uuid::new_v4()),
            file_name: file.name.clone(),
            mime,
            data_url,
            dimensions,
        }
    }
}
