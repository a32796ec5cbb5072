//! Scoped ownership of platform handles.

use std::path::Path;

use log::{debug, warn};

use crate::{errors::PlatformError, platform::ResourcePlatform};

/// Data-only module mapping that is released when the guard goes out of scope.
///
/// A guard only exists for a successfully loaded module, so the release call happens exactly once.
pub struct ModuleGuard<'p, P: ResourcePlatform> {
    platform: &'p P,
    module:   P::Module,
}
impl<'p, P: ResourcePlatform> ModuleGuard<'p, P> {
    /// Load the file at `path` as a data-only module.
    pub fn load(platform: &'p P, path: &Path) -> Result<Self, PlatformError> {
        let module = platform.load_data_module(path)?;
        debug!("loaded data module {}", path.display());
        Ok(Self { platform, module })
    }

    /// Returns the platform the module was loaded with.
    pub fn platform(&self) -> &'p P { self.platform }

    /// Returns the loaded module.
    pub fn module(&self) -> &P::Module { &self.module }
}
impl<P: ResourcePlatform> Drop for ModuleGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.platform.release_module(&mut self.module) {
            warn!("failed to release module: {}", e);
        }
    }
}

/// Resource update transaction that is discarded when the guard goes out of scope without being committed.
pub struct UpdateGuard<'p, P: ResourcePlatform> {
    platform: &'p P,
    update:   P::Update,
    finished: bool,
}
impl<'p, P: ResourcePlatform> UpdateGuard<'p, P> {
    /// Open a resource update transaction for the file at `path`.
    pub fn begin(platform: &'p P, path: &Path) -> Result<Self, PlatformError> {
        let update = platform.open_for_update(path)?;
        debug!("opened resource update for {}", path.display());
        Ok(Self {
            platform,
            update,
            finished: false,
        })
    }

    /// Returns the platform the transaction was opened with.
    pub fn platform(&self) -> &'p P { self.platform }

    /// Returns the open transaction.
    pub fn update_mut(&mut self) -> &mut P::Update { &mut self.update }

    /// Commit the transaction.
    ///
    /// The transaction is finished even if the commit fails, it is not discarded a second time.
    pub fn commit(mut self) -> Result<(), PlatformError> {
        self.finished = true;
        self.platform.commit_update(&mut self.update, false)
    }
}
impl<P: ResourcePlatform> Drop for UpdateGuard<'_, P> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("discarding uncommitted resource update");
        if let Err(e) = self.platform.commit_update(&mut self.update, true) {
            warn!("failed to discard resource update: {}", e);
        }
    }
}
