//! **Res**ource **util**ity for portable executables.
//!
//! Supports:
//! * Writing raw data as a resource of an executable or library
//! * Reading resources back out
//! * Enumerating resource types, ids and languages
//! * Copying resources between files
//!
//! See [`ResourceEditor`] for the main entry point. The editor runs on a [`ResourcePlatform`]:
//! [`PortablePlatform`] parses and rebuilds the resource section in pure Rust on every host,
//! `NativePlatform` forwards to the Windows resource API and is only available on Windows.
//!
//! # Examples
//!
//! ### Resource round trip
//! ```
//! use resutil::{ResourceEditor, ResourceId, ResourceType};
//!
//! let editor = ResourceEditor::new();
//! let resource_type = ResourceType::resolve("rcdata");
//! let id = ResourceId::parse("1")?;
//!
//! // write the resource into the executable
//! editor.write(b"hello", EXECUTABLE_PATH, &resource_type, &id)?;
//!
//! // read it back
//! let data = editor.read(EXECUTABLE_PATH, &resource_type, &id)?;
//! assert_eq!(data, b"hello");
//! ```
//!
//! ### Enumeration
//! ```
//! use resutil::ResourceEditor;
//!
//! let editor = ResourceEditor::new();
//! for name in editor.enumerate_types(EXECUTABLE_PATH)? {
//!     println!("{}", name);
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

pub(crate) mod editor;
pub(crate) mod errors;
pub(crate) mod handle;
pub(crate) mod identifier;
pub(crate) mod image;
#[cfg(windows)]
pub(crate) mod native;
pub(crate) mod platform;
pub(crate) mod portable;
pub(crate) mod registry;
pub(crate) mod resource;
pub(crate) mod util;

pub mod constants;
pub mod types;

#[cfg(windows)]
pub use crate::native::*;
pub use crate::{
    editor::*, errors::*, handle::*, identifier::*, image::*, platform::*, portable::*, registry::*,
    resource::*,
};
