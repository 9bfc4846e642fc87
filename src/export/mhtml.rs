//! MIME-HTML (`multipart/related`) archives.

use std::fmt::Write as _;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use sha2::{Digest, Sha256};

const LINE_WIDTH: usize = 76;

/// A resource stored next to the page in an archive.
#[derive(Debug, Clone)]
pub struct MhtmlResource {
    /// Link as written in the page, relative to it.
    pub location: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MhtmlResource {
    pub fn new(location: String, path: &Path, data: Vec<u8>) -> Self {
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Self {
            location,
            content_type,
            data,
        }
    }
}

/// Builds an archive holding `html` as its root part plus `resources`.
///
/// The boundary is derived from the content, so equal input gives equal
/// output.
pub fn write_mhtml(
    title: &str,
    html_location: &str,
    html: &str,
    resources: &[MhtmlResource],
) -> String {
    let boundary = boundary_for(html, resources);
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "From: <Saved by tome>\r\n\
         Subject: {}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/related;\r\n\
         \ttype=\"text/html\";\r\n\
         \tboundary=\"{boundary}\"\r\n\r\n",
        encode_header(title)
    );

    push_part(
        &mut out,
        &boundary,
        "text/html; charset=utf-8",
        html_location,
        html.as_bytes(),
    );
    for resource in resources {
        push_part(
            &mut out,
            &boundary,
            &resource.content_type,
            &resource.location,
            &resource.data,
        );
    }
    let _ = write!(out, "--{boundary}--\r\n");
    out
}

fn push_part(out: &mut String, boundary: &str, content_type: &str, location: &str, data: &[u8]) {
    let _ = write!(
        out,
        "--{boundary}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Transfer-Encoding: base64\r\n\
         Content-Location: file:///{location}\r\n\r\n"
    );
    let encoded = general_purpose::STANDARD.encode(data);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
}

fn boundary_for(html: &str, resources: &[MhtmlResource]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    for resource in resources {
        hasher.update(resource.location.as_bytes());
        hasher.update(&resource.data);
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("----MultipartBoundary--{}----", &digest[..32])
}

/// RFC 2047 encoded word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", general_purpose::STANDARD.encode(value))
    }
}
