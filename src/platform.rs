//! Platform resource interface.
//!
//! [`ResourcePlatform`] is the seam between the resource engine and the facility that actually opens, updates and maps
//! portable executables. The crate ships a pure Rust [`PortablePlatform`](crate::PortablePlatform) and, on Windows,
//! a [`NativePlatform`](crate::NativePlatform) backed by the system resource API.

use std::path::Path;

use crate::{constants::LANGID, errors::PlatformError, identifier::ResourceId, registry::ResourceType};

/// Resource update and lookup facilities of a platform.
///
/// Every failing call returns a [`PlatformError`] carrying the platform error code at the time of the failure.
/// Handles returned by [`open_for_update`](Self::open_for_update) and [`load_data_module`](Self::load_data_module)
/// are released exactly once by [`commit_update`](Self::commit_update) and [`release_module`](Self::release_module).
/// Use [`UpdateGuard`](crate::UpdateGuard) and [`ModuleGuard`](crate::ModuleGuard) to tie those calls to a scope.
pub trait ResourcePlatform {
    /// Open resource update transaction.
    type Update;
    /// Module loaded as a data-only mapping.
    type Module;
    /// Located resource within a module.
    type Resource;

    /// Open a resource update transaction for the file at `path`.
    fn open_for_update(&self, path: &Path) -> Result<Self::Update, PlatformError>;

    /// Add or replace a resource in the transaction.
    ///
    /// `data` may be longer than `size`, only the first `size` bytes are declared as resource data.
    fn submit_update(
        &self, update: &mut Self::Update, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
        data: &[u8], size: u32,
    ) -> Result<(), PlatformError>;

    /// Finish the transaction, writing all submitted resources unless `discard` is set.
    fn commit_update(&self, update: &mut Self::Update, discard: bool) -> Result<(), PlatformError>;

    /// Map the file at `path` as a data-only module. No code is executed and no references are resolved.
    fn load_data_module(&self, path: &Path) -> Result<Self::Module, PlatformError>;

    /// Release a module mapping.
    fn release_module(&self, module: &mut Self::Module) -> Result<(), PlatformError>;

    /// Locate a resource by type, id and language.
    fn find_resource(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
    ) -> Result<Self::Resource, PlatformError>;

    /// Returns the declared size of a located resource in bytes.
    fn size_of(&self, module: &Self::Module, resource: &Self::Resource) -> u32;

    /// Returns the resource data, valid for as long as the module is mapped.
    fn lock_resource<'m>(
        &self, module: &'m Self::Module, resource: &Self::Resource,
    ) -> Result<&'m [u8], PlatformError>;

    /// Visit the ids of all resources of a type until `visit` returns `false`.
    fn enumerate_names(
        &self, module: &Self::Module, resource_type: &ResourceType, visit: &mut dyn FnMut(ResourceId) -> bool,
    ) -> Result<(), PlatformError>;

    /// Visit all resource types present in the module until `visit` returns `false`.
    fn enumerate_types(
        &self, module: &Self::Module, visit: &mut dyn FnMut(ResourceType) -> bool,
    ) -> Result<(), PlatformError>;

    /// Visit the languages stored for a resource until `visit` returns `false`.
    fn enumerate_languages(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId,
        visit: &mut dyn FnMut(LANGID) -> bool,
    ) -> Result<(), PlatformError>;
}
