//! Expanding a live-script archive into a directory and packing it back.
//!
//! [`unpack`] records a [`Manifest`] of what the archive held so that
//! [`repack`] can write entries back in their original order with their
//! original timestamps. Repacking the same tree twice therefore yields the
//! same bytes.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, IoContext, Result};
use crate::io::LocalFileReader;
use crate::zip::{CompressionMethod, DosTimestamp, RawName, ZipExtractor, ZipWriter};

/// One entry of the input archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Decoded name.
    pub name: String,
    /// Name bytes exactly as stored in the archive.
    pub raw_name: RawName,
    /// Same name as a relative path, `.` components dropped.
    pub path: PathBuf,
    pub is_directory: bool,
    pub modified: DosTimestamp,
}

/// Entries of the input archive in central directory order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the archive has a file (not a directory) at `name`.
    pub fn contains_file(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| !e.is_directory && (e.name == name || e.path == Path::new(name)))
    }
}

/// Turn an archive entry name into a relative path that cannot leave the
/// extraction directory.
pub fn entry_path(name: &str) -> Result<PathBuf> {
    let unsafe_name = || Error::archive(format!("unsafe entry name: {name}"));

    if name.contains('\\') || name.contains(':') {
        return Err(unsafe_name());
    }

    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_name());
            }
        }
    }

    if path.as_os_str().is_empty() {
        return Err(unsafe_name());
    }
    Ok(path)
}

/// Extract every entry of `input` under `dest`.
///
/// # Errors
///
/// Fails if `input` cannot be opened, is not a ZIP archive, has an entry we
/// cannot decode, or names a path outside `dest`.
pub async fn unpack(input: &Path, dest: &Path) -> Result<Manifest> {
    let reader = Arc::new(LocalFileReader::new(input)?);
    let extractor = ZipExtractor::new(reader);
    let files = extractor.list_files().await?;

    let mut entries = Vec::with_capacity(files.len());
    for file in &files {
        let path = entry_path(&file.file_name)?;
        let target = dest.join(&path);

        if file.is_directory {
            tokio::fs::create_dir_all(&target).await.at(&target)?;
        } else {
            extractor.extract_to_file(file, &target).await?;
        }
        debug!(entry = %file.file_name, size = file.uncompressed_size, "extracted");

        entries.push(ManifestEntry {
            name: file.file_name.clone(),
            raw_name: file.raw_name.clone(),
            path,
            is_directory: file.is_directory,
            modified: file.modified,
        });
    }

    debug!(entries = entries.len(), input = %input.display(), "unpacked archive");
    Ok(Manifest { entries })
}

/// Pack the tree under `source` into a new DEFLATE archive at `output`.
///
/// Entries listed in `manifest` come first, in manifest order, with their
/// recorded names and timestamps; directory entries are written only for
/// directories the manifest lists. Files under `source` the manifest does
/// not know about follow in sorted order. An existing `output` is deleted
/// first, never merged into.
///
/// Returns the number of entries written.
pub async fn repack(source: &Path, manifest: &Manifest, output: &Path) -> Result<usize> {
    let mut writer = ZipWriter::new();
    let mut written: HashSet<PathBuf> = HashSet::new();

    for entry in manifest.entries() {
        let on_disk = source.join(&entry.path);
        if !written.insert(entry.path.clone()) {
            continue;
        }
        if entry.is_directory {
            if on_disk.is_dir() {
                writer.add_directory(entry.raw_name.clone(), entry.modified)?;
            }
        } else if on_disk.is_file() {
            let data = tokio::fs::read(&on_disk).await.at(&on_disk)?;
            let name = entry.raw_name.clone();
            writer.add_file(name, &data, CompressionMethod::Deflate, entry.modified)?;
        }
    }

    for item in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let item = item.map_err(|e| Error::Stream(e.into()))?;
        if !item.file_type().is_file() {
            continue;
        }
        let relative = item
            .path()
            .strip_prefix(source)
            .map_err(|_| {
                Error::archive(format!("{} escaped the scratch tree", item.path().display()))
            })?
            .to_path_buf();
        if written.contains(&relative) {
            continue;
        }

        let name = archive_name(&relative);
        let data = tokio::fs::read(item.path()).await.at(item.path())?;
        writer.add_file(name.as_str(), &data, CompressionMethod::Deflate, DosTimestamp::EPOCH)?;
        debug!(entry = %name, "added file not present in input archive");
        written.insert(relative);
    }

    let count = writer.len();
    let bytes = writer.finish()?;

    if tokio::fs::try_exists(output).await.at(output)? {
        tokio::fs::remove_file(output).await.at(output)?;
        info!(output = %output.display(), "removed existing output file");
    }
    tokio::fs::write(output, &bytes).await.at(output)?;

    debug!(entries = count, bytes = bytes.len(), output = %output.display(), "wrote archive");
    Ok(count)
}

/// Archive names always use `/`, whatever the host separator.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_paths_stay_inside() {
        assert_eq!(
            entry_path("matlab/document.xml").unwrap(),
            Path::new("matlab").join("document.xml")
        );
        assert_eq!(entry_path("./metadata/").unwrap(), PathBuf::from("metadata"));
        for bad in ["../evil", "a/../../b", "/etc/passwd", "C:/x", "a\\b", "", "./"] {
            assert!(
                matches!(entry_path(bad), Err(Error::Archive(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn archive_names_use_forward_slashes() {
        let rel = Path::new("matlab").join("output.xml");
        assert_eq!(archive_name(&rel), "matlab/output.xml");
    }

    #[test]
    fn manifest_file_lookup_ignores_directories() {
        let manifest = Manifest {
            entries: vec![
                ManifestEntry {
                    name: "matlab/".into(),
                    raw_name: "matlab/".into(),
                    path: "matlab".into(),
                    is_directory: true,
                    modified: DosTimestamp::EPOCH,
                },
                ManifestEntry {
                    name: "matlab/document.xml".into(),
                    raw_name: "matlab/document.xml".into(),
                    path: Path::new("matlab").join("document.xml"),
                    is_directory: false,
                    modified: DosTimestamp::EPOCH,
                },
            ],
        };
        assert!(manifest.contains_file("matlab/document.xml"));
        assert!(!manifest.contains_file("matlab"));
        assert!(!manifest.contains_file("matlab/output.xml"));
        assert_eq!(manifest.len(), 2);
    }

    #[tokio::test]
    async fn unpack_then_repack_keeps_order_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.zip");
        let ts = DosTimestamp::new(2022, 2, 2, 10, 0, 0);

        let mut writer = ZipWriter::new();
        writer.add_file("z.txt", b"last-first", CompressionMethod::Stored, ts).unwrap();
        writer.add_directory("media", ts).unwrap();
        writer.add_file("a/b.txt", b"nested", CompressionMethod::Deflate, ts).unwrap();
        std::fs::write(&input, writer.finish().unwrap()).unwrap();

        let scratch = dir.path().join("scratch");
        let manifest = unpack(&input, &scratch).await.unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(std::fs::read(scratch.join("a").join("b.txt")).unwrap(), b"nested");
        assert!(scratch.join("media").is_dir());

        let output = dir.path().join("out.zip");
        assert_eq!(repack(&scratch, &manifest, &output).await.unwrap(), 3);

        let again = unpack(&output, &dir.path().join("scratch2")).await.unwrap();
        let names: Vec<_> = again.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["z.txt", "media/", "a/b.txt"]);
        assert!(again.entries().iter().all(|e| e.modified == ts));
    }

    #[tokio::test]
    async fn legacy_encoded_names_survive_repack() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.zip");
        // CP437 "média/é.png", no UTF-8 flag
        let name = RawName::new(b"m\x82dia/\x82.png".to_vec(), 0);

        let mut writer = ZipWriter::new();
        writer
            .add_file(name.clone(), b"img", CompressionMethod::Stored, DosTimestamp::EPOCH)
            .unwrap();
        std::fs::write(&input, writer.finish().unwrap()).unwrap();

        let scratch = dir.path().join("scratch");
        let manifest = unpack(&input, &scratch).await.unwrap();
        let output = dir.path().join("out.zip");
        repack(&scratch, &manifest, &output).await.unwrap();

        let again = unpack(&output, &dir.path().join("scratch2")).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again.entries()[0].raw_name, name);
    }

    #[tokio::test]
    async fn repack_appends_unknown_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("tree");
        std::fs::create_dir_all(scratch.join("sub")).unwrap();
        std::fs::write(scratch.join("b.txt"), b"b").unwrap();
        std::fs::write(scratch.join("a.txt"), b"a").unwrap();
        std::fs::write(scratch.join("sub").join("c.txt"), b"c").unwrap();

        let output = dir.path().join("out.zip");
        repack(&scratch, &Manifest::default(), &output).await.unwrap();

        let manifest = unpack(&output, &dir.path().join("check")).await.unwrap();
        let names: Vec<_> = manifest.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[tokio::test]
    async fn repack_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("tree");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("only.txt"), b"fresh").unwrap();

        let output = dir.path().join("out.zip");
        std::fs::write(&output, b"stale bytes that are not a zip").unwrap();

        repack(&scratch, &Manifest::default(), &output).await.unwrap();
        let manifest = unpack(&output, &dir.path().join("check")).await.unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].name, "only.txt");
    }

    #[tokio::test]
    async fn unpack_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.mlx");
        std::fs::write(&input, b"this is not an archive at all").unwrap();
        let err = unpack(&input, &dir.path().join("x")).await.unwrap_err();
        assert!(matches!(err, Error::Archive(_)), "{err}");
    }

    #[tokio::test]
    async fn unpack_rejects_escaping_entries() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("evil.zip");
        let mut writer = ZipWriter::new();
        writer
            .add_file("../escape.txt", b"x", CompressionMethod::Stored, DosTimestamp::EPOCH)
            .unwrap();
        std::fs::write(&input, writer.finish().unwrap()).unwrap();

        let err = unpack(&input, &dir.path().join("x")).await.unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }
}
