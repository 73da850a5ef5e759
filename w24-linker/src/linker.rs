//! Object loading, placement and relocation

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use w24_spec::{namespace_for, Import, RelocatableObject, ADDRESS_SPACE};

use crate::config::MemoryConfig;
use crate::error::{LinkError, Result};
use crate::image::MemoryImage;
use crate::store::{normalize, object_path, FsObjectStore, ObjectStore};
use crate::symbols::{SymbolPolicy, SymbolTable};

/// Linker settings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub policy: SymbolPolicy,
    /// Directories searched for imports not found next to the importer
    pub search_dirs: Vec<PathBuf>,
}

/// An object taking part in the link
#[derive(Clone, Debug)]
pub struct LoadedObject {
    pub path: PathBuf,
    pub namespace: String,
    pub object: RelocatableObject,
}

impl LoadedObject {
    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct Linker<S = FsObjectStore> {
    config: MemoryConfig,
    options: LinkOptions,
    store: S,
    symbols: SymbolTable,
    /// Post-order: imports before their importer
    objects: Vec<LoadedObject>,
    /// Directory of the main object
    root: PathBuf,
}

impl Linker<FsObjectStore> {
    pub fn new(config: MemoryConfig, options: LinkOptions) -> Self {
        Self::with_store(config, options, FsObjectStore)
    }
}

impl<S: ObjectStore> Linker<S> {
    pub fn with_store(config: MemoryConfig, options: LinkOptions, store: S) -> Self {
        let symbols = SymbolTable::new(options.policy);
        Self {
            config,
            options,
            store,
            symbols,
            objects: Vec::new(),
            root: PathBuf::new(),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Symbols of the last link, complete or not
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Objects of the last link in load order
    pub fn objects(&self) -> &[LoadedObject] {
        &self.objects
    }

    /// Link `main` and everything it imports into one image
    pub fn link(&mut self, main: impl AsRef<Path>) -> Result<MemoryImage> {
        self.symbols = SymbolTable::new(self.options.policy);
        self.objects.clear();

        let main = normalize(main.as_ref());
        self.root = main.parent().map(Path::to_path_buf).unwrap_or_default();
        info!(path = %main.display(), "loading main object");
        let mut loading = BTreeSet::new();
        self.load(&main, namespace_for(&main), &mut loading)?;

        let mut image = MemoryImage::new();
        self.place(&mut image)?;
        self.relocate(&mut image)?;

        info!(
            objects = self.objects.len(),
            symbols = self.symbols.len(),
            words = image.len(),
            "linked"
        );
        Ok(image)
    }

    fn load(
        &mut self,
        path: &Path,
        namespace: String,
        loading: &mut BTreeSet<PathBuf>,
    ) -> Result<()> {
        if self.objects.iter().any(|loaded| loaded.path == path) {
            return Ok(());
        }
        if !loading.insert(path.to_path_buf()) {
            warn!(path = %path.display(), "import cycle, skipping");
            return Ok(());
        }

        let object = self.store.load(path)?;
        info!(path = %path.display(), namespace = %namespace, "loading object");

        for import in object.imports() {
            let resolved = self.resolve_import(path, import)?;
            self.load(&resolved, import.namespace(), loading)?;
        }

        let loaded = LoadedObject {
            path: path.to_path_buf(),
            namespace,
            object,
        };
        self.register_labels(&loaded)?;

        loading.remove(path);
        self.objects.push(loaded);
        Ok(())
    }

    /// Candidate paths: next to the importer, then the main object's
    /// directory, then each search directory
    fn resolve_import(&self, importer: &Path, import: &Import) -> Result<PathBuf> {
        let relative = object_path(&import.file);
        let base = importer.parent().unwrap_or_else(|| Path::new(""));

        [base, self.root.as_path()]
            .into_iter()
            .chain(self.options.search_dirs.iter().map(PathBuf::as_path))
            .map(|dir| normalize(&dir.join(&relative)))
            .find(|candidate| self.store.exists(candidate))
            .ok_or_else(|| LinkError::MissingImport {
                file: import.file.clone(),
                importer: importer.display().to_string(),
            })
    }

    fn register_labels(&mut self, loaded: &LoadedObject) -> Result<()> {
        let name = loaded.name();
        for (label, location) in loaded.object.labels() {
            let base = self.config.base(&location.segment).ok_or_else(|| {
                LinkError::UnknownSegment {
                    segment: location.segment.clone(),
                    object: name.clone(),
                }
            })?;
            let address = base + location.offset;
            let qualified = format!("{}.{}", loaded.namespace, label);

            debug!(symbol = %qualified, address = format_args!("{address:#08X}"), "label");
            self.symbols.define(&qualified, address, &name);
            self.symbols.define(label, address, &name);
        }
        Ok(())
    }

    fn place(&self, image: &mut MemoryImage) -> Result<()> {
        let mut owners: BTreeMap<&str, String> = BTreeMap::new();

        for loaded in &self.objects {
            let name = loaded.name();
            for (segment_name, words) in loaded.object.segments() {
                let segment = self.config.segment(segment_name).ok_or_else(|| {
                    LinkError::UnknownSegment {
                        segment: segment_name.clone(),
                        object: name.clone(),
                    }
                })?;
                if words.is_empty() {
                    continue;
                }

                if words.len() > segment.size as usize {
                    return Err(LinkError::SegmentOverflow {
                        segment: segment_name.clone(),
                        object: name,
                        length: words.len(),
                        capacity: segment.size,
                    });
                }
                let end = u64::from(segment.start) + words.len() as u64;
                if end > u64::from(ADDRESS_SPACE) {
                    return Err(LinkError::AddressOutOfBounds {
                        segment: segment_name.clone(),
                        object: name,
                        end,
                    });
                }
                if let Some(first) = owners.get(segment_name.as_str()) {
                    return Err(LinkError::SegmentCollision {
                        segment: segment_name.clone(),
                        first: first.clone(),
                        second: name,
                    });
                }
                owners.insert(segment_name, name.clone());

                for (address, &word) in (segment.start..).zip(words) {
                    image.set(address, word);
                }
                info!(
                    segment = %segment_name,
                    object = %name,
                    start = format_args!("{:#08X}", segment.start),
                    words = words.len(),
                    "placed"
                );
            }
        }
        Ok(())
    }

    fn relocate(&self, image: &mut MemoryImage) -> Result<()> {
        for loaded in &self.objects {
            let name = loaded.name();
            for relocation in loaded.object.relocations() {
                let base = self.config.base(&relocation.segment).ok_or_else(|| {
                    LinkError::UnknownSegment {
                        segment: relocation.segment.clone(),
                        object: name.clone(),
                    }
                })?;
                let target = self.symbols.resolve(&relocation.symbol, &name)?;
                if target >= ADDRESS_SPACE {
                    return Err(LinkError::AddressOutOfRange {
                        symbol: relocation.symbol.clone(),
                        object: name,
                        address: u64::from(target),
                    });
                }
                let position = base + relocation.offset;

                debug!(
                    symbol = %relocation.symbol,
                    position = format_args!("{position:#08X}"),
                    target = format_args!("{target:#08X}"),
                    "relocation"
                );
                image.set(position, target);
            }
        }
        Ok(())
    }
}
