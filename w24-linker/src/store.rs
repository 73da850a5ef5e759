//! Object storage and import path resolution

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{LinkError, Result};
use w24_spec::RelocatableObject;

/// Source of relocatable objects, keyed by path
pub trait ObjectStore {
    fn exists(&self, path: &Path) -> bool;

    fn load(&self, path: &Path) -> Result<RelocatableObject>;
}

/// Reads JSON object files from disk
#[derive(Clone, Copy, Debug, Default)]
pub struct FsObjectStore;

impl ObjectStore for FsObjectStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path) -> Result<RelocatableObject> {
        if !self.exists(path) {
            return Err(LinkError::ObjectNotFound(path.to_path_buf()));
        }
        Ok(RelocatableObject::load(path)?)
    }
}

/// In-memory objects
#[derive(Clone, Debug, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<PathBuf, RelocatableObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, object: RelocatableObject) {
        self.objects.insert(normalize(path.as_ref()), object);
    }

    pub fn with(mut self, path: impl AsRef<Path>, object: RelocatableObject) -> Self {
        self.insert(path, object);
        self
    }
}

impl ObjectStore for MemoryObjectStore {
    fn exists(&self, path: &Path) -> bool {
        self.objects.contains_key(&normalize(path))
    }

    fn load(&self, path: &Path) -> Result<RelocatableObject> {
        let object = self
            .objects
            .get(&normalize(path))
            .ok_or_else(|| LinkError::ObjectNotFound(path.to_path_buf()))?;
        object.validate()?;
        Ok(object.clone())
    }
}

/// Object file named by an `!IMPORT` line: `.asm` becomes `.obj`, a missing
/// extension gets `.obj`.
pub fn object_path(file: &str) -> PathBuf {
    let path = PathBuf::from(file);
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("asm") => path.with_extension("obj"),
        Some(_) => path,
        None => path.with_extension("obj"),
    }
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
