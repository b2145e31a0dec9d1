//! Test fixtures: PDF and PNG blobs of a requested size.

use axum_test::multipart::{MultipartForm, Part};

pub const MB: usize = 1024 * 1024;

/// Minimal PDF header padded to `size` bytes.
pub fn pdf_of_size(size: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(size.max(data.len()), b' ');
    data
}

/// PNG signature padded to `size` bytes.
pub fn png_of_size(size: usize) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(size.max(data.len()), 0);
    data
}

/// Single `file` part with the given name and content type.
pub fn file_form(filename: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type(content_type.to_string());
    MultipartForm::new().add_part("file", part)
}
