//! Module source reference parsing
//!
//! Turns the references operators write (`./modules/vpc`,
//! `github.com/org/repo//sub?ref=v1`, `git::https://host/repo.git`) into a
//! canonical URL plus an optional module subdirectory.
//!
//! Classification is purely syntactic: a reference is local when it looks
//! like a filesystem path or uses the `file` scheme, never because something
//! happens to exist on disk.

use crate::error::{ModcacheError, ModcacheResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Protocol name of the local filesystem backend
pub const FILE_PROTOCOL: &str = "file";

/// A canonical module source URL
///
/// Query parameters are kept sorted so that equivalent references compare
/// (and fingerprint) equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    forced: Option<String>,
    url: Url,
}

impl SourceUrl {
    /// Build from a URL and an optional forced protocol
    pub fn new(forced: Option<&str>, mut url: Url) -> Self {
        sort_query(&mut url);
        Self {
            forced: forced.map(str::to_ascii_lowercase),
            url,
        }
    }

    /// Parse a reference, rejecting `//subdir` components
    pub fn parse(raw: &str, base_dir: &Path) -> ModcacheResult<Self> {
        let (root, subdir) = split_source(raw, base_dir)?;
        if !subdir.is_empty() {
            return Err(ModcacheError::resolution(
                raw,
                "a module subdirectory is not allowed here",
            ));
        }
        Ok(root)
    }

    /// Protocol used to pick a fetch backend
    pub fn protocol(&self) -> &str {
        self.forced.as_deref().unwrap_or_else(|| self.url.scheme())
    }

    /// Protocol forced with a `<proto>::` prefix, if any
    pub fn forced(&self) -> Option<&str> {
        self.forced.as_deref()
    }

    /// The underlying URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether this source points at the local filesystem
    pub fn is_local(&self) -> bool {
        self.url.scheme() == FILE_PROTOCOL
    }

    /// Filesystem path for `file` URLs
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_local() {
            self.url.to_file_path().ok()
        } else {
            None
        }
    }

    /// Value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Copy of this URL with the given query parameters removed
    pub fn without_query_keys(&self, keys: &[&str]) -> Self {
        let mut url = self.url.clone();
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .into_owned()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .collect();
        set_query_pairs(&mut url, kept);
        Self {
            forced: self.forced.clone(),
            url,
        }
    }

    /// Copy of this URL without any query
    pub fn without_query(&self) -> Self {
        let mut url = self.url.clone();
        url.set_query(None);
        Self {
            forced: self.forced.clone(),
            url,
        }
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.forced {
            Some(ref forced) => write!(f, "{}::{}", forced, self.url),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Parse a raw reference into its canonical root URL and module subdirectory.
///
/// Relative local paths are resolved against `base_dir`. The subdirectory is
/// the part after a `//` separator (`repo.git//modules/vpc`) and is empty when
/// the module lives at the root.
pub fn split_source(raw: &str, base_dir: &Path) -> ModcacheResult<(SourceUrl, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ModcacheError::resolution(raw, "source is empty"));
    }

    let (forced, rest) = split_forced(raw)?;
    let (root, subdir) = split_subdir(rest);
    let subdir = validate_subdir(raw, subdir)?;

    let url = detect(raw, forced, &root, base_dir)?;
    let forced = match forced {
        Some(f) => Some(f),
        None if is_git_shorthand(&root) => Some("git"),
        None => None,
    };

    Ok((SourceUrl::new(forced, url), subdir))
}

fn split_forced(raw: &str) -> ModcacheResult<(Option<&str>, &str)> {
    if raw.starts_with("::") {
        return Err(ModcacheError::resolution(raw, "missing protocol before '::'"));
    }
    match raw.split_once("::") {
        Some((proto, rest)) if proto.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok((Some(proto), rest))
        }
        _ => Ok((None, raw)),
    }
}

fn split_subdir(source: &str) -> (String, String) {
    let (body, query) = match source.split_once('?') {
        Some((body, query)) => (body, Some(query)),
        None => (source, None),
    };

    let start = body.find("://").map(|i| i + 3).unwrap_or(0);
    let (root, subdir) = match body[start..].find("//") {
        Some(idx) => {
            let idx = start + idx;
            (&body[..idx], &body[idx + 2..])
        }
        None => (body, ""),
    };

    let root = match query {
        Some(q) => format!("{}?{}", root, q),
        None => root.to_string(),
    };
    (root, subdir.trim_matches('/').to_string())
}

fn validate_subdir(raw: &str, subdir: String) -> ModcacheResult<String> {
    let escapes = Path::new(&subdir)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ModcacheError::resolution(
            raw,
            "module subdirectory must stay inside the downloaded source",
        ));
    }
    Ok(subdir)
}

fn looks_like_path(s: &str) -> bool {
    s == "."
        || s == ".."
        || s.starts_with('/')
        || s.starts_with("./")
        || s.starts_with("../")
        || s.starts_with("~/")
}

fn is_git_shorthand(root: &str) -> bool {
    root.starts_with("github.com/") || root.starts_with("git@")
}

fn detect(raw: &str, forced: Option<&str>, root: &str, base_dir: &Path) -> ModcacheResult<Url> {
    let forced_file = forced.is_some_and(|f| f.eq_ignore_ascii_case(FILE_PROTOCOL));

    if looks_like_path(root) || (forced_file && !root.starts_with("file://")) {
        return local_url(raw, root, base_dir);
    }

    if let Some(rest) = root.strip_prefix("github.com/") {
        return github_url(raw, rest);
    }

    if let Some(rest) = root.strip_prefix("git@") {
        return scp_like_url(raw, rest);
    }

    match Url::parse(root) {
        Ok(url) if !url.cannot_be_a_base() || url.scheme() == FILE_PROTOCOL => Ok(url),
        Ok(_) | Err(_) => Err(ModcacheError::resolution(
            raw,
            "expected a URL, a local path, or a github.com/ or git@ shorthand",
        )),
    }
}

fn local_url(raw: &str, root: &str, base_dir: &Path) -> ModcacheResult<Url> {
    let (path, query) = match root.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (root, None),
    };

    let path = match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .ok_or_else(|| ModcacheError::resolution(raw, "cannot expand '~': no home directory"))?
            .join(rest),
        None => PathBuf::from(path),
    };
    let absolute = normalize_path(&base_dir.join(path));

    let mut url = Url::from_file_path(&absolute).map_err(|()| {
        ModcacheError::resolution(raw, format!("{} is not an absolute path", absolute.display()))
    })?;
    url.set_query(query);
    Ok(url)
}

fn github_url(raw: &str, rest: &str) -> ModcacheResult<Url> {
    let mut url = Url::parse(&format!("https://github.com/{}", rest))
        .map_err(|e| ModcacheError::resolution(raw, e.to_string()))?;

    let segments = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).count())
        .unwrap_or(0);
    if segments < 2 {
        return Err(ModcacheError::resolution(
            raw,
            "GitHub shorthand must be github.com/<owner>/<repo>",
        ));
    }

    if !url.path().ends_with(".git") {
        let path = format!("{}.git", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    Ok(url)
}

fn scp_like_url(raw: &str, rest: &str) -> ModcacheResult<Url> {
    let (host, path) = rest
        .split_once(':')
        .filter(|(host, _)| !host.is_empty() && !host.contains('/'))
        .ok_or_else(|| ModcacheError::resolution(raw, "expected git@<host>:<path>"))?;

    Url::parse(&format!("ssh://git@{}/{}", host, path.trim_start_matches('/')))
        .map_err(|e| ModcacheError::resolution(raw, e.to_string()))
}

/// Lexically normalize a path, resolving `.` and `..` without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn sort_query(url: &mut Url) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort();
    set_query_pairs(url, pairs);
}

fn set_query_pairs(url: &mut Url, pairs: Vec<(String, String)>) {
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}
