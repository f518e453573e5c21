//! Utilities for staging file trees and generating ISO 9660 images.
//!
//! Two independent, stateless operations:
//!
//! - **File materializer** ([`staging::write_files`]) - writes a mapping of
//!   relative paths to byte content under a target directory, creating
//!   intermediate directories as needed.
//! - **Image generator** ([`image::gen_iso_image`]) - shells out to
//!   `genisoimage` to produce an ISO 9660 image (Rock Ridge + Joliet) from
//!   a source directory, stamped with a volume identifier.
//!
//! The external tool sits behind the [`image::ImageBuilder`] trait so it
//! can be mocked in tests. [`preflight`] checks tool availability up front.
//!
//! Both operations are synchronous and blocking, hold no state between
//! calls, and return the first error encountered without retrying or
//! rolling back.
//!
//! # Example
//!
//! ```rust,ignore
//! use iso_staging::{gen_iso_image, write_files, FileMap};
//! use std::path::Path;
//!
//! let mut content = FileMap::new();
//! content.insert("user-data".into(), b"#cloud-config\n".to_vec());
//! content.insert("meta-data".into(), b"instance-id: vm-1\n".to_vec());
//!
//! write_files(Path::new("staging/"), &content)?;
//! gen_iso_image(Path::new("out/config.iso"), "cidata", Path::new("staging/"))?;
//! ```

pub mod image;
pub mod preflight;
pub mod process;
pub mod staging;

pub use image::{gen_iso_image, Genisoimage, ImageBuilder};
pub use staging::{collect_files, write_files, FileMap};
