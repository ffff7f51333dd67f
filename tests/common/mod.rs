//! Fixtures for building small live-script archives.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mlx_remove_code::xml::WORDPROCESSING_NS;
use mlx_remove_code::zip::{CompressionMethod, DosTimestamp};
use mlx_remove_code::ZipWriter;

pub const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
pub const CORE_PROPS: &[u8] = br#"<cp:coreProperties xmlns:cp="urn:cp"><dc:title xmlns:dc="urn:dc">Lesson</dc:title></cp:coreProperties>"#;
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR fake image payload";

pub fn timestamp() -> DosTimestamp {
    DosTimestamp::new(2024, 1, 15, 9, 41, 20)
}

pub fn document(body: &str) -> String {
    format!(
        r#"<w:document xmlns:w="{WORDPROCESSING_NS}" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><w:body>{body}</w:body></w:document>"#
    )
}

pub fn code(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="code"/></w:pPr><w:r><w:t><![CDATA[{text}]]></w:t></w:r></w:p>"#
    )
}

pub fn prose(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="text"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
    )
}

/// Entries of a typical live script, with `doc` as `matlab/document.xml`.
pub fn mlx_entries(doc: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        ("[Content_Types].xml".into(), CONTENT_TYPES.to_vec()),
        ("metadata/coreProperties.xml".into(), CORE_PROPS.to_vec()),
        ("matlab/document.xml".into(), doc.as_bytes().to_vec()),
        ("media/image1.png".into(), PNG.to_vec()),
    ]
}

pub fn write_archive(path: &Path, entries: &[(String, Vec<u8>)]) {
    let mut writer = ZipWriter::new();
    writer.add_directory("matlab", timestamp()).unwrap();
    for (name, data) in entries {
        let method = if name.ends_with(".png") {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflate
        };
        writer.add_file(name.as_str(), data, method, timestamp()).unwrap();
    }
    std::fs::write(path, writer.finish().unwrap()).unwrap();
}

/// Read every file entry of an archive as (name, bytes), in archive order.
pub async fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let reader = std::sync::Arc::new(mlx_remove_code::LocalFileReader::new(path).unwrap());
    let extractor = mlx_remove_code::ZipExtractor::new(reader);
    let mut out = Vec::new();
    for entry in extractor.list_files().await.unwrap() {
        if entry.is_directory {
            out.push((entry.file_name.clone(), Vec::new()));
        } else {
            let data = extractor.extract_to_memory(&entry).await.unwrap();
            out.push((entry.file_name.clone(), data));
        }
    }
    out
}

pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| d.as_slice())
        .unwrap_or_else(|| panic!("{name} missing from archive"))
}

pub fn sample_path(dir: &Path, name: &str, doc: &str) -> PathBuf {
    let path = dir.join(name);
    write_archive(&path, &mlx_entries(doc));
    path
}
