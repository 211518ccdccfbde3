//! URLs, resource identifiers and file names.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::truncate_bytes;

/// Hosts (and their subdomains) that links may point at
const TRUSTED_GOOGLE_HOSTS: &[&str] = &[
    "drive.google.com",
    "docs.google.com",
    "sheets.google.com",
    "slides.google.com",
    "mail.google.com",
    "calendar.google.com",
    "meet.google.com",
    "accounts.google.com",
    "googleapis.com",
    "www.googleapis.com",
];

const MAX_FILE_NAME_BYTES: usize = 255;
const FALLBACK_FILE_NAME: &str = "download";
const FORBIDDEN_FILE_NAME_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

static OPAQUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("opaque id pattern is valid"));

static RESOURCE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,256}$").expect("resource id pattern is valid"));

/// True only for absolute `https` URLs on a Google host from the allow-list.
pub fn is_trusted_google_url(candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate.trim()) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    TRUSTED_GOOGLE_HOSTS.iter().any(|trusted| {
        host == *trusted
            || host
                .strip_suffix(trusted)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Accept a strictly alphanumeric identifier and return it percent-encoded for
/// use inside a URL path. `None` if the identifier has any other character.
pub fn sanitize_opaque_id(id: &str) -> Option<String> {
    if !OPAQUE_ID.is_match(id) {
        return None;
    }
    Some(urlencoding::encode(id).into_owned())
}

/// Accept a Drive file id or Gmail label id.
///
/// These ids use the URL-safe alphabet (`-` and `_` included), so they can be
/// placed in a path without encoding.
pub fn sanitize_resource_id(id: &str) -> Option<String> {
    RESOURCE_ID.is_match(id).then(|| id.to_string())
}

/// Make a user-supplied name safe to use as a file or folder name.
///
/// Path separators, `<>:"|?*` and control characters are removed, leading dots
/// are dropped (no `.`/`..`/hidden names), and names over 255 bytes are cut
/// down with the extension preserved. Falls back to `"download"`.
pub fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !FORBIDDEN_FILE_NAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim_start();

    if cleaned.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME_BYTES {
        return cleaned.to_string();
    }

    match cleaned.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && ext.len() + 1 < MAX_FILE_NAME_BYTES => {
            let base = truncate_bytes(base, MAX_FILE_NAME_BYTES - ext.len() - 1);
            format!("{}.{}", base, ext)
        }
        _ => truncate_bytes(cleaned, MAX_FILE_NAME_BYTES).to_string(),
    }
}
