//! ISO 9660 image generation.
//!
//! Wraps the `genisoimage` tool behind the [`ImageBuilder`] trait so the
//! external dependency can be swapped or mocked in tests. Images are
//! created with Rock Ridge and Joliet extensions over the full contents
//! of a source directory.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha512};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Capability interface for producing an ISO 9660 image from a directory.
pub trait ImageBuilder {
    /// Build an image at `iso_path` with the given volume identifier,
    /// containing the recursive contents of `src_dir`.
    ///
    /// The volume identifier is passed through verbatim; the underlying
    /// tool enforces or rejects ISO 9660 character and length limits.
    fn build(&self, iso_path: &Path, volume_id: &str, src_dir: &Path) -> Result<()>;
}

/// [`ImageBuilder`] backed by the `genisoimage` executable.
pub struct Genisoimage {
    program: String,
}

impl Default for Genisoimage {
    fn default() -> Self {
        Self {
            program: "genisoimage".to_string(),
        }
    }
}

impl Genisoimage {
    /// Use a different executable name. Intended for tests and for hosts
    /// where the tool is installed as `mkisofs`.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl ImageBuilder for Genisoimage {
    fn build(&self, iso_path: &Path, volume_id: &str, src_dir: &Path) -> Result<()> {
        if !src_dir.is_dir() {
            bail!(
                "error generating iso: source directory '{}' does not exist",
                src_dir.display()
            );
        }

        Cmd::new(&self.program)
            .arg("-o")
            .arg_path(iso_path)
            .args(["-V", volume_id]) // Volume label, stamped verbatim
            .arg("-r") // Rock Ridge with sane ownership/modes
            .arg("-J") // Joliet names for Windows readers
            .arg_path(src_dir)
            .error_msg("error generating iso")
            .run()?;

        Ok(())
    }
}

/// Build an ISO 9660 image with the default `genisoimage` backend.
///
/// # Example
///
/// ```rust,ignore
/// use iso_staging::image::gen_iso_image;
/// use std::path::Path;
///
/// gen_iso_image(Path::new("out/config.iso"), "cidata", Path::new("staging/"))?;
/// ```
pub fn gen_iso_image(iso_path: &Path, volume_id: &str, src_dir: &Path) -> Result<()> {
    Genisoimage::default().build(iso_path, volume_id, src_dir)
}

/// Write a SHA-512 checksum file next to a generated image.
///
/// The checksum is written as `<iso_path>.sha512` in the standard
/// coreutils format `<hash>  <filename>` (two spaces, filename only) so
/// users can verify with `sha512sum -c` from the containing directory.
///
/// Returns the path of the checksum file.
pub fn write_iso_checksum(iso_path: &Path) -> Result<PathBuf> {
    let bytes = fs::read(iso_path)
        .with_context(|| format!("error reading '{}'", iso_path.display()))?;
    let hash = format!("{:x}", Sha512::digest(&bytes));

    let filename = iso_path
        .file_name()
        .with_context(|| format!("'{}' has no filename", iso_path.display()))?
        .to_string_lossy();

    let checksum_path = PathBuf::from(format!("{}.sha512", iso_path.display()));
    fs::write(&checksum_path, format!("{}  {}\n", hash, filename))
        .with_context(|| format!("error writing '{}'", checksum_path.display()))?;

    Ok(checksum_path)
}
