//! Pure Rust resource platform.
//!
//! Updates parse the target image, edit its resource directory in memory and rebuild the resource section on commit.
//! The rebuilt image is written to a temporary file next to the target and renamed over it,
//! so a failed commit leaves the target untouched.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::{
    constants::*,
    errors::PlatformError,
    identifier::ResourceId,
    image::Image,
    platform::ResourcePlatform,
    registry::ResourceType,
    resource::*,
};

/// Resource platform implemented on top of [`Image`] and [`ResourceDirectory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PortablePlatform;

/// Open resource update of a [`PortablePlatform`].
#[derive(Debug)]
pub struct PortableUpdate {
    path:      PathBuf,
    image:     Image<'static>,
    directory: ResourceDirectory,
}

/// Resource directory of an image loaded by a [`PortablePlatform`].
#[derive(Debug)]
pub struct DataModule {
    directory: Option<ResourceDirectory>,
}

/// Resource located by a [`PortablePlatform`].
#[derive(Debug, Clone)]
pub struct PortableResource {
    resource_type: ResourceEntryName,
    name:          ResourceEntryName,
    language:      LANGID,
}

impl ResourcePlatform for PortablePlatform {
    type Module = DataModule;
    type Resource = PortableResource;
    type Update = PortableUpdate;

    fn open_for_update(&self, path: &Path) -> Result<Self::Update, PlatformError> {
        let image = Image::parse_file(path)?;
        let directory = image.resource_directory().cloned().unwrap_or_default();
        Ok(PortableUpdate {
            path: path.to_path_buf(),
            image,
            directory,
        })
    }

    fn submit_update(
        &self, update: &mut Self::Update, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
        data: &[u8], size: u32,
    ) -> Result<(), PlatformError> {
        let data = data.get(..size as usize).ok_or_else(|| {
            PlatformError::new(
                ERROR_INVALID_DATA,
                format!("declared size {} exceeds {} bytes of data", size, data.len()),
            )
        })?;
        debug!("updating resource {} of type {} ({} bytes)", id, resource_type, size);
        update.directory.insert(
            &type_entry_name(resource_type),
            &id_entry_name(id),
            language,
            ResourceData::new(data.to_vec()),
        );
        Ok(())
    }

    fn commit_update(&self, update: &mut Self::Update, discard: bool) -> Result<(), PlatformError> {
        if discard {
            debug!("discarding resource update of {}", update.path.display());
            return Ok(());
        }
        update.image.set_resource_directory(update.directory.clone())?;

        let parent = match update.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(parent)?;
        update.image.write_writer(file.as_file_mut())?;
        file.as_file().sync_all()?;
        if let Ok(metadata) = fs::metadata(&update.path) {
            file.as_file().set_permissions(metadata.permissions())?;
        }
        file.persist(&update.path).map_err(|e| PlatformError::from(e.error))?;
        debug!("committed resource update of {}", update.path.display());
        Ok(())
    }

    fn load_data_module(&self, path: &Path) -> Result<Self::Module, PlatformError> {
        let mut image = Image::parse_file(path)?;
        Ok(DataModule {
            directory: image.resource_directory.take(),
        })
    }

    fn release_module(&self, module: &mut Self::Module) -> Result<(), PlatformError> {
        module.directory = None;
        Ok(())
    }

    fn find_resource(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
    ) -> Result<Self::Resource, PlatformError> {
        let type_name = type_entry_name(resource_type);
        let name = id_entry_name(id);
        let languages = language_table(module, &type_name, &name)?;

        if languages.get(ResourceEntryName::ID(language as u32)).and_then(ResourceEntry::data).is_some() {
            return Ok(PortableResource {
                resource_type: type_name,
                name,
                language,
            });
        }
        if language != LANGUAGE_ID_NEUTRAL {
            return Err(PlatformError::new(
                ERROR_RESOURCE_LANG_NOT_FOUND,
                format!("language {:#06x} not found", language),
            ));
        }
        let fallback = languages
            .sorted_entries()
            .into_iter()
            .filter(|(_, entry)| entry.data().is_some())
            .find_map(|(key, _)| key.id().and_then(|id| LANGID::try_from(id).ok()));
        match fallback {
            Some(language) => {
                debug!("using language {:#06x} for neutral lookup", language);
                Ok(PortableResource {
                    resource_type: type_name,
                    name,
                    language,
                })
            }
            None => Err(PlatformError::new(ERROR_RESOURCE_LANG_NOT_FOUND, "resource has no language entries")),
        }
    }

    fn size_of(&self, module: &Self::Module, resource: &Self::Resource) -> u32 {
        self.lock_resource(module, resource).map(|data| data.len() as u32).unwrap_or_default()
    }

    fn lock_resource<'m>(
        &self, module: &'m Self::Module, resource: &Self::Resource,
    ) -> Result<&'m [u8], PlatformError> {
        module
            .directory
            .as_ref()
            .and_then(|directory| directory.get(&resource.resource_type, &resource.name, resource.language))
            .map(ResourceData::data)
            .ok_or_else(|| PlatformError::new(ERROR_RESOURCE_DATA_NOT_FOUND, "resource data is no longer mapped"))
    }

    fn enumerate_names(
        &self, module: &Self::Module, resource_type: &ResourceType, visit: &mut dyn FnMut(ResourceId) -> bool,
    ) -> Result<(), PlatformError> {
        let names = module
            .directory
            .as_ref()
            .and_then(|directory| directory.root().get(type_entry_name(resource_type)))
            .and_then(ResourceEntry::table);
        let Some(names) = names else {
            debug!("no resources of type {}", resource_type);
            return Ok(());
        };
        for (name, _) in names.sorted_entries() {
            let id = match name {
                ResourceEntryName::ID(id) => match WORD::try_from(*id) {
                    Ok(id) => ResourceId::Numeric(id),
                    Err(_) => {
                        warn!("skipping resource id {:#x?} larger than 16 bits", id);
                        continue;
                    }
                },
                ResourceEntryName::Name(_) => ResourceId::Named(name.name().unwrap_or_default()),
            };
            if !visit(id) {
                break;
            }
        }
        Ok(())
    }

    fn enumerate_types(
        &self, module: &Self::Module, visit: &mut dyn FnMut(ResourceType) -> bool,
    ) -> Result<(), PlatformError> {
        let Some(directory) = module.directory.as_ref() else {
            return Ok(());
        };
        for (name, _) in directory.root().sorted_entries() {
            let resource_type = match name {
                ResourceEntryName::ID(code) => match WORD::try_from(*code) {
                    Ok(code) => ResourceType::from_code(code),
                    Err(_) => {
                        warn!("skipping resource type {:#x?} larger than 16 bits", code);
                        continue;
                    }
                },
                ResourceEntryName::Name(_) => ResourceType::Custom(name.name().unwrap_or_default()),
            };
            if !visit(resource_type) {
                break;
            }
        }
        Ok(())
    }

    fn enumerate_languages(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId,
        visit: &mut dyn FnMut(LANGID) -> bool,
    ) -> Result<(), PlatformError> {
        let languages = language_table(module, &type_entry_name(resource_type), &id_entry_name(id))?;
        for (name, _) in languages.sorted_entries() {
            let Some(language) = name.id().and_then(|id| LANGID::try_from(id).ok()) else {
                warn!("skipping invalid language entry {:?}", name);
                continue;
            };
            if !visit(language) {
                break;
            }
        }
        Ok(())
    }
}

fn language_table<'m>(
    module: &'m DataModule, resource_type: &ResourceEntryName, name: &ResourceEntryName,
) -> Result<&'m ResourceTable, PlatformError> {
    let directory = module
        .directory
        .as_ref()
        .ok_or_else(|| PlatformError::new(ERROR_RESOURCE_DATA_NOT_FOUND, "image has no resource section"))?;
    let names = directory
        .root()
        .get(resource_type)
        .and_then(ResourceEntry::table)
        .ok_or_else(|| PlatformError::new(ERROR_RESOURCE_TYPE_NOT_FOUND, "resource type not found"))?;
    names
        .get(name)
        .and_then(ResourceEntry::table)
        .ok_or_else(|| PlatformError::new(ERROR_RESOURCE_NAME_NOT_FOUND, "resource name not found"))
}

fn type_entry_name(resource_type: &ResourceType) -> ResourceEntryName {
    match resource_type {
        ResourceType::Custom(name) => ResourceEntryName::from_string(name),
        _ => ResourceEntryName::ID(resource_type.code().unwrap_or_default() as u32),
    }
}

fn id_entry_name(id: &ResourceId) -> ResourceEntryName {
    match id {
        ResourceId::Numeric(id) => ResourceEntryName::ID(*id as u32),
        ResourceId::Named(name) => ResourceEntryName::from_string(name),
    }
}
