use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::BoxedIncludeProviderError;

/// Normalized path of a source file; the identity used for cycle detection,
/// guards, and deduplication.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ResolvedIncludePath(pub PathBuf);

impl ResolvedIncludePath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        ResolvedIncludePath(normalize_path(path.as_ref()))
    }

    /// Leaf of the path, as shown in output markers.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.to_string())
    }

    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl fmt::Display for ResolvedIncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// User-supplied include reader
pub trait IncludeProvider {
    /// Resolve `path` as written in an import directive inside `from`.
    ///
    /// The default resolves relative to the directory of `from`.
    fn resolve_path(
        &self,
        path: &str,
        from: &ResolvedIncludePath,
    ) -> Result<ResolvedIncludePath, BoxedIncludeProviderError> {
        Ok(ResolvedIncludePath::new(from.dir().join(path)))
    }

    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError>;
}

/// Reads sources straight from the filesystem.
#[derive(Default)]
pub struct FileIncludeProvider;

impl IncludeProvider for FileIncludeProvider {
    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError> {
        Ok(std::fs::read_to_string(&path.0)?)
    }
}

/// Serves sources from memory, keyed by normalized path.
#[derive(Default)]
pub struct MemoryIncludeProvider {
    files: HashMap<ResolvedIncludePath, String>,
}

impl MemoryIncludeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files
            .insert(ResolvedIncludePath::new(path), source.into());
    }
}

impl<P, S> FromIterator<(P, S)> for MemoryIncludeProvider
where
    P: AsRef<Path>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut provider = MemoryIncludeProvider::new();
        for (path, source) in iter {
            provider.insert(path, source);
        }
        provider
    }
}

impl IncludeProvider for MemoryIncludeProvider {
    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {}", path).into())
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component. The filesystem is never consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }

    normalized
}
