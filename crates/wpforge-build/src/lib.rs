//! Provisioning stages for wpforge.
//!
//! # Pipeline
//!
//! ```text
//! wpforge
//!   1. Fetch     ── checksum URL, then tarball only if the cache is stale
//!   2. Extract   ── rm -rf wordpress/ ; untar latest.tar.gz
//!   3. Ownership ── docker run --rm -v wordpress:/app ubuntu chown -R :daemon /app/
//!   4. Render    ── templates/*.j2 → wp-config.php, wp_automate.php, .htaccess
//!   5. Image     ── git clone recipe → overlay → patch Dockerfile → docker build
//! ```
//!
//! # Idempotence
//!
//! Every stage deletes what it is about to recreate (extracted tree, recipe
//! clone, rendered files), so re-running after a failure starts clean. Only
//! the tarball is kept between runs, as a cache keyed by its checksum.

pub mod checksum;
pub mod directive;
pub mod extract;
pub mod fetch;
pub mod image;
pub mod permissions;
pub mod render;

pub use fetch::{FetchOutcome, Fetcher};
pub use image::{ImageCustomizer, ImageTag};
pub use render::{RenderOptions, TemplateJob, TemplateRenderer};
