/// Backend registry and device factory
///
/// Backend crates register a factory closure at startup (each exposes a
/// `register()` function). `create_device` picks one: an explicit backend
/// is honoured without fallback, `Backend::Unknown` probes the platform
/// order and ends with OpenGL.

use std::sync::{Arc, Mutex, OnceLock};

use rustc_hash::FxHashMap;

use crate::backend::{Backend, BACKEND_ENV_VAR};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, NativeWindow};

/// Factory function creating a device for one backend
pub type DeviceFactory =
    Arc<dyn Fn(&dyn NativeWindow, &Config) -> Result<Box<dyn GraphicsDevice>> + Send + Sync>;

static REGISTRY: OnceLock<Mutex<FxHashMap<Backend, DeviceFactory>>> = OnceLock::new();

fn registry() -> &'static Mutex<FxHashMap<Backend, DeviceFactory>> {
    REGISTRY.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// Register (or replace) the factory for `backend`
pub fn register_backend<F>(backend: Backend, factory: F)
where
    F: Fn(&dyn NativeWindow, &Config) -> Result<Box<dyn GraphicsDevice>> + Send + Sync + 'static,
{
    if backend == Backend::Unknown {
        crate::sprout_warn!("sprout::factory", "Refusing to register a factory for Backend::Unknown");
        return;
    }
    match registry().lock() {
        Ok(mut map) => {
            map.insert(backend, Arc::new(factory));
            crate::sprout_debug!("sprout::factory", "Registered {} backend", backend);
        }
        Err(_) => crate::sprout_error!("sprout::factory", "Backend registry lock poisoned"),
    }
}

pub fn is_registered(backend: Backend) -> bool {
    registry()
        .lock()
        .map(|map| map.contains_key(&backend))
        .unwrap_or(false)
}

/// Registered backends in platform probe order
pub fn registered_backends() -> Vec<Backend> {
    Backend::preferred_order()
        .iter()
        .copied()
        .filter(|b| is_registered(*b))
        .collect()
}

fn factory_for(backend: Backend) -> Result<Option<DeviceFactory>> {
    let map = registry()
        .lock()
        .map_err(|_| Error::BackendError("Backend registry lock poisoned".to_string()))?;
    Ok(map.get(&backend).cloned())
}

/// Create a device for `window`
///
/// A valid `SPROUT_BACKEND` value overrides `backend`.
pub fn create_device(
    window: &dyn NativeWindow,
    backend: Backend,
    config: &Config,
) -> Result<Box<dyn GraphicsDevice>> {
    let requested = match Backend::from_env() {
        Some(over) if over != backend => {
            crate::sprout_info!(
                "sprout::factory",
                "{} overrides requested backend {} with {}",
                BACKEND_ENV_VAR,
                backend,
                over
            );
            over
        }
        _ => backend,
    };

    if requested != Backend::Unknown {
        return create_explicit(window, requested, config);
    }

    let mut last_error = None;
    for &candidate in Backend::preferred_order() {
        let Some(factory) = factory_for(candidate)? else {
            crate::sprout_debug!("sprout::factory", "{} backend not registered, skipping", candidate);
            continue;
        };
        match factory(window, config) {
            Ok(device) => {
                crate::sprout_info!("sprout::factory", "Created {} device", candidate);
                return Ok(device);
            }
            Err(e) => {
                crate::sprout_warn!("sprout::factory", "{} device creation failed: {}", candidate, e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => Error::InitializationFailed(format!("No backend could be created, last error: {}", e)),
        None => Error::InitializationFailed("No graphics backend is registered".to_string()),
    })
}

fn create_explicit(
    window: &dyn NativeWindow,
    backend: Backend,
    config: &Config,
) -> Result<Box<dyn GraphicsDevice>> {
    let factory = factory_for(backend)?.ok_or_else(|| {
        Error::InitializationFailed(format!("{} backend is not registered", backend))
    })?;
    let device = factory(window, config)?;
    crate::sprout_info!("sprout::factory", "Created {} device", backend);
    Ok(device)
}

/// Remove every registered factory
#[cfg(test)]
pub(crate) fn clear_registry() {
    if let Ok(mut map) = registry().lock() {
        map.clear();
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
