//! # W24 Linker
//!
//! Combine relocatable objects into one absolute memory image.
//!
//! The linker loads a main object and, recursively, every object it
//! imports. Each object's labels are published twice in a global symbol
//! table: qualified by the object's namespace (`MATH.SQUARE`) and bare
//! (`SQUARE`). Segments are then placed at the addresses declared by a
//! [`MemoryConfig`] and every relocation is patched with the absolute
//! address of its symbol.
//!
//! ## Example
//!
//! ```rust,no_run
//! use w24_linker::{Linker, LinkOptions, MemoryConfig};
//!
//! let config = MemoryConfig::load("memory.cfg").unwrap();
//! let mut linker = Linker::new(config, LinkOptions::default());
//! let image = linker.link("main.obj").unwrap();
//! image.write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod linker;
pub mod store;
pub mod symbols;

pub use config::{MemoryConfig, Segment};
pub use error::{ConfigError, LinkError, Result};
pub use image::{MemoryImage, IMAGE_HEADER, WORDS_PER_LINE};
pub use linker::{LinkOptions, LoadedObject, Linker};
pub use store::{normalize, object_path, FsObjectStore, MemoryObjectStore, ObjectStore};
pub use symbols::{SymbolPolicy, SymbolTable};
