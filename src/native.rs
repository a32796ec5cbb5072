//! Windows resource platform backed by the system resource API.

use std::{ffi::c_void, iter, os::windows::ffi::OsStrExt, path::Path, slice};

use log::debug;
use windows_sys::{
    core::PCWSTR,
    Win32::{
        Foundation::{FreeLibrary, BOOL, FALSE, HANDLE, HMODULE, INVALID_HANDLE_VALUE, TRUE},
        System::LibraryLoader::{
            BeginUpdateResourceW, EndUpdateResourceW, EnumResourceLanguagesW, EnumResourceNamesW,
            EnumResourceTypesW, FindResourceExW, LoadLibraryExW, LoadResource, LockResource,
            SizeofResource, UpdateResourceW, LOAD_LIBRARY_AS_DATAFILE, LOAD_LIBRARY_AS_IMAGE_RESOURCE,
        },
    },
};

use crate::{
    constants::*,
    errors::PlatformError,
    identifier::ResourceId,
    platform::ResourcePlatform,
    registry::ResourceType,
    util::{from_wide, to_wide},
};

/// Resource platform forwarding to `BeginUpdateResourceW`, `LoadLibraryExW` and related functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

/// Update handle returned by `BeginUpdateResourceW`.
#[derive(Debug)]
pub struct NativeUpdate {
    handle: HANDLE,
}

/// Module handle returned by `LoadLibraryExW`.
#[derive(Debug)]
pub struct NativeModule {
    handle: HMODULE,
}

/// Resource handle returned by `FindResourceExW`.
#[derive(Debug)]
pub struct NativeResource {
    handle: *mut c_void,
}

impl ResourcePlatform for NativePlatform {
    type Module = NativeModule;
    type Resource = NativeResource;
    type Update = NativeUpdate;

    fn open_for_update(&self, path: &Path) -> Result<Self::Update, PlatformError> {
        let path = wide_path(path);
        let handle = unsafe { BeginUpdateResourceW(path.as_ptr(), FALSE) };
        if !is_valid(handle) {
            return Err(PlatformError::last_os_error());
        }
        Ok(NativeUpdate { handle })
    }

    fn submit_update(
        &self, update: &mut Self::Update, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
        data: &[u8], size: u32,
    ) -> Result<(), PlatformError> {
        if size as usize > data.len() {
            return Err(PlatformError::new(ERROR_INVALID_DATA, "declared size exceeds data"));
        }
        let resource_type = WideName::of_type(resource_type);
        let id = WideName::of_id(id);
        let result = unsafe {
            UpdateResourceW(
                update.handle,
                resource_type.as_ptr(),
                id.as_ptr(),
                language,
                data.as_ptr() as *const c_void,
                size,
            )
        };
        check(result)
    }

    fn commit_update(&self, update: &mut Self::Update, discard: bool) -> Result<(), PlatformError> {
        debug!("ending resource update (discard: {})", discard);
        let result = unsafe { EndUpdateResourceW(update.handle, if discard { TRUE } else { FALSE }) };
        check(result)
    }

    fn load_data_module(&self, path: &Path) -> Result<Self::Module, PlatformError> {
        let path = wide_path(path);
        let handle = unsafe {
            LoadLibraryExW(
                path.as_ptr(),
                std::ptr::null_mut(),
                LOAD_LIBRARY_AS_DATAFILE | LOAD_LIBRARY_AS_IMAGE_RESOURCE,
            )
        };
        if !is_valid(handle) {
            return Err(PlatformError::last_os_error());
        }
        Ok(NativeModule { handle })
    }

    fn release_module(&self, module: &mut Self::Module) -> Result<(), PlatformError> {
        check(unsafe { FreeLibrary(module.handle) })
    }

    fn find_resource(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId, language: LANGID,
    ) -> Result<Self::Resource, PlatformError> {
        let resource_type = WideName::of_type(resource_type);
        let id = WideName::of_id(id);
        let handle =
            unsafe { FindResourceExW(module.handle, resource_type.as_ptr(), id.as_ptr(), language) };
        if handle.is_null() {
            return Err(PlatformError::last_os_error());
        }
        Ok(NativeResource { handle })
    }

    fn size_of(&self, module: &Self::Module, resource: &Self::Resource) -> u32 {
        unsafe { SizeofResource(module.handle, resource.handle) }
    }

    fn lock_resource<'m>(
        &self, module: &'m Self::Module, resource: &Self::Resource,
    ) -> Result<&'m [u8], PlatformError> {
        let size = self.size_of(module, resource);
        let data = unsafe { LoadResource(module.handle, resource.handle) };
        if data.is_null() {
            return Err(PlatformError::last_os_error());
        }
        let pointer = unsafe { LockResource(data) };
        if pointer.is_null() {
            return Err(PlatformError::last_os_error());
        }
        // resource data stays mapped until the module is released
        Ok(unsafe { slice::from_raw_parts(pointer as *const u8, size as usize) })
    }

    fn enumerate_names(
        &self, module: &Self::Module, resource_type: &ResourceType, visit: &mut dyn FnMut(ResourceId) -> bool,
    ) -> Result<(), PlatformError> {
        let resource_type = WideName::of_type(resource_type);
        let mut state = Enumeration { visit, stopped: false };
        let result = unsafe {
            EnumResourceNamesW(
                module.handle,
                resource_type.as_ptr(),
                Some(visit_name),
                &mut state as *mut Enumeration<ResourceId> as isize,
            )
        };
        state.finish(result)
    }

    fn enumerate_types(
        &self, module: &Self::Module, visit: &mut dyn FnMut(ResourceType) -> bool,
    ) -> Result<(), PlatformError> {
        let mut state = Enumeration { visit, stopped: false };
        let result = unsafe {
            EnumResourceTypesW(
                module.handle,
                Some(visit_type),
                &mut state as *mut Enumeration<ResourceType> as isize,
            )
        };
        state.finish(result)
    }

    fn enumerate_languages(
        &self, module: &Self::Module, resource_type: &ResourceType, id: &ResourceId,
        visit: &mut dyn FnMut(LANGID) -> bool,
    ) -> Result<(), PlatformError> {
        let resource_type = WideName::of_type(resource_type);
        let id = WideName::of_id(id);
        let mut state = Enumeration { visit, stopped: false };
        let result = unsafe {
            EnumResourceLanguagesW(
                module.handle,
                resource_type.as_ptr(),
                id.as_ptr(),
                Some(visit_language),
                &mut state as *mut Enumeration<LANGID> as isize,
            )
        };
        if result == FALSE && !state.stopped {
            return Err(PlatformError::last_os_error());
        }
        Ok(())
    }
}

/// Encode a path as null-terminated UTF-16, keeping units that are not valid Unicode.
fn wide_path(path: &Path) -> Vec<u16> { path.as_os_str().encode_wide().chain(iter::once(0)).collect() }

fn is_valid(handle: HANDLE) -> bool { !handle.is_null() && handle != INVALID_HANDLE_VALUE }

fn check(result: BOOL) -> Result<(), PlatformError> {
    if result == FALSE {
        return Err(PlatformError::last_os_error());
    }
    Ok(())
}

/// Resource type or name argument, either an integer resource or a null-terminated wide string.
enum WideName {
    Integer(WORD),
    Text(Vec<u16>),
}
impl WideName {
    fn of_type(resource_type: &ResourceType) -> Self {
        match resource_type {
            ResourceType::Custom(name) => WideName::Text(to_wide(name)),
            _ => WideName::Integer(resource_type.code().unwrap_or_default()),
        }
    }

    fn of_id(id: &ResourceId) -> Self {
        match id {
            ResourceId::Numeric(id) => WideName::Integer(*id),
            ResourceId::Named(name) => WideName::Text(to_wide(name)),
        }
    }

    fn as_ptr(&self) -> PCWSTR {
        match self {
            // MAKEINTRESOURCEW
            WideName::Integer(id) => *id as usize as PCWSTR,
            WideName::Text(text) => text.as_ptr(),
        }
    }

    /// Decode a type or name argument passed to an enumeration callback.
    unsafe fn decode(name: PCWSTR) -> Self {
        if (name as usize) >> 16 == 0 {
            return WideName::Integer(name as usize as WORD);
        }
        let mut length = 0;
        while *name.add(length) != 0 {
            length += 1;
        }
        WideName::Text(slice::from_raw_parts(name, length).to_vec())
    }
}

struct Enumeration<'v, T> {
    visit:   &'v mut dyn FnMut(T) -> bool,
    stopped: bool,
}
impl<T> Enumeration<'_, T> {
    fn accept(&mut self, value: T) -> BOOL {
        if (self.visit)(value) {
            TRUE
        } else {
            self.stopped = true;
            FALSE
        }
    }

    /// Names and types of a module without resources of the requested kind enumerate as empty.
    fn finish(&self, result: BOOL) -> Result<(), PlatformError> {
        if result != FALSE || self.stopped {
            return Ok(());
        }
        let error = PlatformError::last_os_error();
        match error.code {
            ERROR_RESOURCE_DATA_NOT_FOUND | ERROR_RESOURCE_TYPE_NOT_FOUND => Ok(()),
            _ => Err(error),
        }
    }
}

unsafe extern "system" fn visit_name(
    _module: HMODULE, _resource_type: PCWSTR, name: *mut u16, state: isize,
) -> BOOL {
    let state = &mut *(state as *mut Enumeration<ResourceId>);
    let id = match WideName::decode(name) {
        WideName::Integer(id) => ResourceId::Numeric(id),
        WideName::Text(text) => ResourceId::Named(from_wide(&text)),
    };
    state.accept(id)
}

unsafe extern "system" fn visit_type(_module: HMODULE, resource_type: *mut u16, state: isize) -> BOOL {
    let state = &mut *(state as *mut Enumeration<ResourceType>);
    let resource_type = match WideName::decode(resource_type) {
        WideName::Integer(code) => ResourceType::from_code(code),
        WideName::Text(text) => ResourceType::Custom(from_wide(&text)),
    };
    state.accept(resource_type)
}

unsafe extern "system" fn visit_language(
    _module: HMODULE, _resource_type: PCWSTR, _name: PCWSTR, language: u16, state: isize,
) -> BOOL {
    let state = &mut *(state as *mut Enumeration<LANGID>);
    state.accept(language)
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, os::windows::ffi::OsStringExt, path::PathBuf};

    use super::*;

    #[test]
    fn keeps_unpaired_surrogates_in_paths() {
        let units = [b'a' as u16, 0xd800, b'.' as u16, b'e' as u16];
        let path = PathBuf::from(OsString::from_wide(&units));
        assert_eq!(wide_path(&path), [b'a' as u16, 0xd800, b'.' as u16, b'e' as u16, 0]);
    }

    #[test]
    fn encodes_integer_names() {
        assert_eq!(WideName::of_id(&ResourceId::Numeric(7)).as_ptr() as usize, 7);
        assert_eq!(WideName::of_type(&ResourceType::resolve("manifest")).as_ptr() as usize, RT_MANIFEST as usize);
        let name = WideName::of_id(&ResourceId::Named("MAIN".to_string()));
        assert!(matches!(unsafe { WideName::decode(name.as_ptr()) }, WideName::Text(text) if from_wide(&text) == "MAIN"));
    }
}
