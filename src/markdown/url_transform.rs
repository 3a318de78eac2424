// src/markdown/url_transform.rs
// =============================================================================
// Rewrites relative asset links (mostly images) into absolute
// raw.githubusercontent.com URLs.
//
// A README at docs/guide/page.md that says ![](../img.png) means
// docs/img.png in the repository. Once the document is rendered outside
// GitHub that relative link points nowhere, so we resolve it against the
// file's directory and prefix the raw-content host.
// =============================================================================

/// Ref used when the caller doesn't know which branch it is looking at
pub const DEFAULT_REF: &str = "main";

const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// `http://`, `https://` (any case) or protocol-relative `//`
pub fn is_absolute_url(url: &str) -> bool {
    let has_prefix = |prefix: &str| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://") || url.starts_with("//")
}

// Resolves `src` against the directory of `current_file`.
// The result is repo-relative without a leading slash.
fn resolve_relative(src: &str, current_file: &str) -> String {
    let mut dir: Vec<&str> = match current_file.rsplit_once('/') {
        Some((dir, _file)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    // Leading slash: relative to the repository root
    if let Some(rooted) = src.strip_prefix('/') {
        return rooted.to_string();
    }

    for segment in src.split('/') {
        match segment {
            ".." => {
                dir.pop();
            }
            "." | "" => {}
            other => dir.push(other),
        }
    }

    dir.join("/")
}

// Turns an image `src` into an absolute URL
//
// Parameters:
//   src: the image reference as written in the document
//   owner, repo: the repository the document lives in
//   current_file: repo-relative path of the document being rendered
//   git_ref: branch/tag/commit, falls back to DEFAULT_REF
//
// Returns: an absolute URL. Absolute inputs pass through untouched, so this
// is safe to apply twice.
//
// Example:
//   ("../img/a.png", "o", "r", "docs/guide/page.md", None)
//     -> "https://raw.githubusercontent.com/o/r/main/docs/img/a.png"
pub fn transform_image_url(
    src: &str,
    owner: &str,
    repo: &str,
    current_file: &str,
    git_ref: Option<&str>,
) -> String {
    if is_absolute_url(src) {
        return src.to_string();
    }

    let git_ref = git_ref.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_REF);
    let resolved = resolve_relative(src, current_file);

    format!("{RAW_CONTENT_BASE}/{owner}/{repo}/{git_ref}/{resolved}")
}
