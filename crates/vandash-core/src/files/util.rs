// Path and display helpers for the file manager.

use serde::Serialize;

/// Largest upload the backend accepts.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico",
];

/// `""` for missing or zero sizes, then `B`, `KB` (one decimal) and `MB`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_file_size(bytes: Option<u64>) -> String {
    match bytes {
        None | Some(0) => String::new(),
        Some(b) if b < 1024 => format!("{b} B"),
        Some(b) if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        Some(b) => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

pub fn is_image_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Strip leading/trailing slashes and empty segments.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of `path`, `""` for top-level entries and the root itself.
pub fn parent_path(path: &str) -> String {
    let path = normalize_path(path);
    match path.rsplit_once('/') {
        Some((parent, _)) => parent.to_owned(),
        None => String::new(),
    }
}

/// Last segment of `path`.
pub fn leaf_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// One clickable breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Cumulative path this crumb navigates to.
    pub path: String,
}

/// `Root` followed by one crumb per path segment.
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        label: "Root".into(),
        path: String::new(),
    }];
    let mut cumulative = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !cumulative.is_empty() {
            cumulative.push('/');
        }
        cumulative.push_str(segment);
        crumbs.push(Breadcrumb {
            label: segment.to_owned(),
            path: cumulative.clone(),
        });
    }
    crumbs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(None), "");
        assert_eq!(format_file_size(Some(0)), "");
        assert_eq!(format_file_size(Some(512)), "512 B");
        assert_eq!(format_file_size(Some(1536)), "1.5 KB");
        assert_eq!(format_file_size(Some(5 * 1024 * 1024)), "5.0 MB");
    }

    #[test]
    fn image_detection_ignores_case() {
        assert!(is_image_file("IMG_0001.JPG"));
        assert!(is_image_file("map.webp"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("jpg"));
    }

    #[test]
    fn breadcrumbs_carry_cumulative_paths() {
        let crumbs = breadcrumbs("trips/2024/june");
        let paths: Vec<_> = crumbs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["", "trips", "trips/2024", "trips/2024/june"]);
        assert_eq!(crumbs[0].label, "Root");
        assert_eq!(breadcrumbs("").len(), 1);
    }

    #[test]
    fn path_helpers() {
        assert_eq!(normalize_path("/trips//2024/"), "trips/2024");
        assert_eq!(parent_path("trips/2024"), "trips");
        assert_eq!(parent_path("trips"), "");
        assert_eq!(leaf_name("trips/2024"), "2024");
        assert_eq!(leaf_name(""), "");
    }
}
