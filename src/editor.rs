//! Resource transactions and lookups on portable executable files.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::{
    constants::*,
    errors::*,
    handle::{ModuleGuard, UpdateGuard},
    identifier::ResourceId,
    platform::ResourcePlatform,
    portable::PortablePlatform,
    registry::ResourceType,
    util::pad_to,
};

/// Reads, writes and enumerates resources of portable executable files through a [`ResourcePlatform`].
///
/// Every operation acquires its own platform handle and releases it before returning.
/// Resources are always written with the neutral language.
#[derive(Debug, Clone, Default)]
pub struct ResourceEditor<P: ResourcePlatform = PortablePlatform> {
    platform: P,
}

impl ResourceEditor<PortablePlatform> {
    /// Create an editor using the [`PortablePlatform`].
    pub fn new() -> Self { Self::default() }
}

impl<P: ResourcePlatform> ResourceEditor<P> {
    /// Create an editor using the given platform.
    pub fn with_platform(platform: P) -> Self { Self { platform } }

    /// Returns the platform used by the editor.
    pub fn platform(&self) -> &P { &self.platform }

    /// Open a resource update transaction on the file at `path`.
    ///
    /// # Returns
    /// Returns a [`ResourceError::FileOpen`] error if the file can not be opened for update.
    pub fn begin<A: AsRef<Path>>(&self, path: A) -> Result<ResourceTransaction<'_, P>, ResourceError> {
        let path = path.as_ref();
        check_path(path)?;
        let guard = UpdateGuard::begin(&self.platform, path).map_err(|source| ResourceError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ResourceTransaction {
            guard,
            path: path.to_path_buf(),
        })
    }

    /// Write `data` as the resource `id` of `resource_type` into the file at `path`, replacing an existing resource.
    ///
    /// # Returns
    /// Returns a [`ResourceError::InvalidData`] error without touching the file if `data` is empty.
    pub fn write<A: AsRef<Path>>(
        &self, data: &[u8], path: A, resource_type: &ResourceType, id: &ResourceId,
    ) -> Result<(), ResourceError> {
        if data.is_empty() {
            return Err(ResourceError::InvalidData);
        }
        check_resource(resource_type, id)?;
        let mut transaction = self.begin(path)?;
        transaction.submit(resource_type, id, data)?;
        transaction.commit()
    }

    /// Read the resource `id` of `resource_type` from the file at `path`.
    ///
    /// # Returns
    /// Returns exactly the declared bytes of the resource.
    pub fn read<A: AsRef<Path>>(
        &self, path: A, resource_type: &ResourceType, id: &ResourceId,
    ) -> Result<Vec<u8>, ResourceError> {
        let path = path.as_ref();
        check_resource(resource_type, id)?;
        let module = self.load(path)?;
        let platform = module.platform();

        let resource = platform
            .find_resource(module.module(), resource_type, id, LANGUAGE_ID_NEUTRAL)
            .map_err(|source| ResourceError::ResourceNotFound {
                path: path.to_path_buf(),
                resource_type: resource_type.clone(),
                id: id.clone(),
                source,
            })?;
        let size = platform.size_of(module.module(), &resource) as usize;
        let lock_error = |source: PlatformError| ResourceError::ResourceLock {
            path: path.to_path_buf(),
            resource_type: resource_type.clone(),
            id: id.clone(),
            source,
        };
        let data = platform.lock_resource(module.module(), &resource).map_err(lock_error)?;
        let data = data.get(..size).ok_or_else(|| {
            lock_error(PlatformError::new(
                ERROR_INVALID_DATA,
                format!("resource declares {} bytes but maps {}", size, data.len()),
            ))
        })?;
        debug!("read resource {} of type {} ({} bytes)", id, resource_type, size);
        Ok(data.to_vec())
    }

    /// Enumerate the ids of all resources of `resource_type` in the file at `path`.
    ///
    /// Numeric ids are returned in decimal form. An empty sequence is returned if the file has no resources of the type.
    pub fn enumerate_ids<A: AsRef<Path>>(
        &self, path: A, resource_type: &ResourceType,
    ) -> Result<ResourceNames, ResourceError> {
        let path = path.as_ref();
        check_type(resource_type)?;
        let module = self.load(path)?;
        let mut names = Vec::new();
        module
            .platform()
            .enumerate_names(module.module(), resource_type, &mut |id: ResourceId| {
                names.push(id.to_string());
                true
            })
            .map_err(|source| enumeration_error(path, source))?;
        Ok(ResourceNames::new(names))
    }

    /// Enumerate the types of all resources in the file at `path`.
    ///
    /// Predefined types are returned by name, custom types as their name wrapped in double quotes
    /// and other numeric types as [`UNKNOWN_TYPE_NAME`](crate::UNKNOWN_TYPE_NAME).
    pub fn enumerate_types<A: AsRef<Path>>(&self, path: A) -> Result<ResourceNames, ResourceError> {
        let path = path.as_ref();
        let module = self.load(path)?;
        let mut names = Vec::new();
        module
            .platform()
            .enumerate_types(module.module(), &mut |resource_type: ResourceType| {
                names.push(resource_type.name());
                true
            })
            .map_err(|source| enumeration_error(path, source))?;
        Ok(ResourceNames::new(names))
    }

    /// Enumerate the languages the resource `id` of `resource_type` is stored in.
    pub fn enumerate_languages<A: AsRef<Path>>(
        &self, path: A, resource_type: &ResourceType, id: &ResourceId,
    ) -> Result<Vec<LANGID>, ResourceError> {
        let path = path.as_ref();
        check_resource(resource_type, id)?;
        let module = self.load(path)?;
        let mut languages = Vec::new();
        module
            .platform()
            .enumerate_languages(module.module(), resource_type, id, &mut |language: LANGID| {
                languages.push(language);
                true
            })
            .map_err(|source| ResourceError::ResourceNotFound {
                path: path.to_path_buf(),
                resource_type: resource_type.clone(),
                id: id.clone(),
                source,
            })?;
        Ok(languages)
    }

    /// Copy the resource `from_id` of `resource_type` from the file at `from` into the file at `to` as `to_id`.
    pub fn copy<A: AsRef<Path>, B: AsRef<Path>>(
        &self, from: A, resource_type: &ResourceType, from_id: &ResourceId, to: B, to_id: &ResourceId,
    ) -> Result<(), ResourceError> {
        let data = self.read(from, resource_type, from_id)?;
        self.write(&data, to, resource_type, to_id)?;
        info!("copied resource {} of type {} to {}", from_id, resource_type, to_id);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<ModuleGuard<'_, P>, ResourceError> {
        check_path(path)?;
        ModuleGuard::load(&self.platform, path).map_err(|source| ResourceError::FileOpen {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Open resource update transaction of a [`ResourceEditor`].
///
/// Dropping the transaction without calling [`commit`](Self::commit) discards all submitted resources.
pub struct ResourceTransaction<'e, P: ResourcePlatform> {
    guard: UpdateGuard<'e, P>,
    path:  PathBuf,
}

impl<P: ResourcePlatform> ResourceTransaction<'_, P> {
    /// Returns the path of the file being updated.
    pub fn path(&self) -> &Path { &self.path }

    /// Add or replace the resource `id` of `resource_type` with `data`.
    ///
    /// The data is padded to [`RESOURCE_DATA_ALIGNMENT`] bytes, the declared size stays the length of `data`.
    /// A failed submission leaves the transaction open.
    pub fn submit(
        &mut self, resource_type: &ResourceType, id: &ResourceId, data: &[u8],
    ) -> Result<(), ResourceError> {
        if data.is_empty() {
            return Err(ResourceError::InvalidData);
        }
        check_resource(resource_type, id)?;
        let size = u32::try_from(data.len()).map_err(|_| {
            ResourceError::InvalidArguments(format!("resource data of {} bytes is too large", data.len()))
        })?;

        let mut buffer = data.to_vec();
        pad_to(&mut buffer, RESOURCE_DATA_ALIGNMENT);
        let platform = self.guard.platform();
        platform
            .submit_update(self.guard.update_mut(), resource_type, id, LANGUAGE_ID_NEUTRAL, &buffer, size)
            .map_err(|source| ResourceError::UpdateFailed {
                resource_type: resource_type.clone(),
                id: id.clone(),
                source,
            })?;
        debug!("submitted resource {} of type {} ({} bytes)", id, resource_type, size);
        Ok(())
    }

    /// Commit all submitted resources to the file.
    pub fn commit(self) -> Result<(), ResourceError> {
        let path = self.path;
        self.guard.commit().map_err(|source| ResourceError::CommitFailed { path, source })
    }
}

/// Owned sequence of resource names returned by the enumeration operations.
///
/// The names are collected while the module is mapped, the mapping is released before the sequence is returned.
#[derive(Debug, Clone)]
pub struct ResourceNames {
    names: std::vec::IntoIter<String>,
}

impl ResourceNames {
    fn new(names: Vec<String>) -> Self {
        Self {
            names: names.into_iter(),
        }
    }
}

impl Iterator for ResourceNames {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> { self.names.next() }

    fn size_hint(&self) -> (usize, Option<usize>) { self.names.size_hint() }
}

impl ExactSizeIterator for ResourceNames {}

fn enumeration_error(path: &Path, source: PlatformError) -> ResourceError {
    ResourceError::EnumerationFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn check_path(path: &Path) -> Result<(), ResourceError> {
    if path.as_os_str().is_empty() {
        return Err(ResourceError::ArgumentNull("path"));
    }
    Ok(())
}

fn check_type(resource_type: &ResourceType) -> Result<(), ResourceError> {
    match resource_type {
        ResourceType::Custom(name) => check_name("type", name),
        _ => Ok(()),
    }
}

fn check_resource(resource_type: &ResourceType, id: &ResourceId) -> Result<(), ResourceError> {
    check_type(resource_type)?;
    match id {
        ResourceId::Named(name) => check_name("id", name),
        // an integer resource of 0 is a null name pointer to the resource API
        ResourceId::Numeric(0) => Err(ResourceError::InvalidArguments("resource id 0 is not a valid id".into())),
        ResourceId::Numeric(_) => Ok(()),
    }
}

fn check_name(argument: &'static str, name: &str) -> Result<(), ResourceError> {
    if name.is_empty() {
        return Err(ResourceError::ArgumentNull(argument));
    }
    if name.encode_utf16().count() > WORD::MAX as usize {
        return Err(ResourceError::InvalidArguments(format!("{} name is longer than {} characters", argument, WORD::MAX)));
    }
    Ok(())
}
