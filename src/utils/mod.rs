// SPDX-License-Identifier: GPL-3.0-only
pub mod path_sanitizer;
pub mod url_validator;

pub use path_sanitizer::{normalize_path, resolve_destination, sanitize_filename};
pub use url_validator::validate_url;
