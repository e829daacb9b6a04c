/// GpuContext - Vulkan instance, device and allocator shared by every object
///
/// Every native resource holds an `Arc<GpuContext>`, so the context is the
/// last thing dropped and tears the device down in a safe order:
/// allocator, debug messenger, device, instance.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use sprout_graphics::sprout::render::NativeWindow;
use sprout_graphics::sprout::Config;
use sprout_graphics::{sprout_debug, sprout_error, sprout_info, sprout_warn, Error, Result};
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped by hand before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Single queue doing graphics and present
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,

    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,
    pub(crate) push_descriptor: ash::khr::push_descriptor::Device,

    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    pub(crate) min_uniform_alignment: u64,
    pub(crate) device_name: String,
}

impl GpuContext {
    /// Bring up a Vulkan 1.3 device able to present to `window`
    ///
    /// Returns the context and the window surface, which the swapchain takes
    /// ownership of.
    pub fn new(window: &dyn NativeWindow, config: &Config) -> Result<(Self, vk::SurfaceKHR)> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                sprout_error!("sprout::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let display_handle = window.display_handle().map_err(|e| {
                sprout_error!("sprout::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let window_handle = window.window_handle().map_err(|e| {
                sprout_error!("sprout::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

            let validation = (cfg!(feature = "vulkan-validation") || config.enable_validation)
                && validation_layer_available(&entry);

            let instance = create_instance(&entry, display_handle.as_raw(), config, validation)?;

            // From here on, failures must release the instance
            match Self::with_instance(entry.clone(), instance.clone(), display_handle.as_raw(), window_handle.as_raw(), validation) {
                Ok(built) => Ok(built),
                Err(e) => {
                    instance.destroy_instance(None);
                    Err(e)
                }
            }
        }
    }

    unsafe fn with_instance(
        entry: ash::Entry,
        instance: ash::Instance,
        display: raw_window_handle::RawDisplayHandle,
        window: raw_window_handle::RawWindowHandle,
        validation: bool,
    ) -> Result<(Self, vk::SurfaceKHR)> {
        let debug_utils = if validation {
            Some(crate::debug::create_messenger(&entry, &instance)?)
        } else {
            None
        };

        let surface = match ash_window::create_surface(&entry, &instance, display, window, None) {
            Ok(surface) => surface,
            Err(e) => {
                sprout_error!("sprout::vulkan", "Failed to create surface: {:?}", e);
                if let Some((loader, messenger)) = &debug_utils {
                    loader.destroy_debug_utils_messenger(*messenger, None);
                }
                return Err(Error::InitializationFailed(format!("Failed to create surface: {:?}", e)));
            }
        };
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let picked = pick_physical_device(&instance, &surface_loader, surface);
        let (physical_device, queue_family) = match picked {
            Ok(found) => found,
            Err(e) => {
                surface_loader.destroy_surface(surface, None);
                if let Some((loader, messenger)) = &debug_utils {
                    loader.destroy_debug_utils_messenger(*messenger, None);
                }
                return Err(e);
            }
        };

        let device = match create_logical_device(&instance, physical_device, queue_family) {
            Ok(device) => device,
            Err(e) => {
                surface_loader.destroy_surface(surface, None);
                if let Some((loader, messenger)) = &debug_utils {
                    loader.destroy_debug_utils_messenger(*messenger, None);
                }
                return Err(e);
            }
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                sprout_error!("sprout::vulkan", "Failed to create GPU allocator: {:?}", e);
                device.destroy_device(None);
                surface_loader.destroy_surface(surface, None);
                if let Some((loader, messenger)) = &debug_utils {
                    loader.destroy_debug_utils_messenger(*messenger, None);
                }
                return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
            }
        };

        let properties = instance.get_physical_device_properties(physical_device);
        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        sprout_info!(
            "sprout::vulkan",
            "Using {} (Vulkan {}.{}.{}, validation {})",
            device_name,
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version),
            if validation { "on" } else { "off" }
        );

        let ctx = Self {
            queue: device.get_device_queue(queue_family, 0),
            queue_family,
            swapchain_loader: ash::khr::swapchain::Device::new(&instance, &device),
            push_descriptor: ash::khr::push_descriptor::Device::new(&instance, &device),
            surface_loader,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            debug_utils,
            min_uniform_alignment: properties.limits.min_uniform_buffer_offset_alignment.max(1),
            device_name,
            entry,
            instance,
            physical_device,
            device,
        };
        Ok((ctx, surface))
    }

    /// Lock the allocator, mapping poisoning to an error
    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub(crate) fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| sprout_graphics::sprout_native_err!("sprout::vulkan", "vkDeviceWaitIdle", e.as_raw()))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator pages go back before the device disappears
            ManuallyDrop::drop(&mut self.allocator);

            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
        crate::debug::report_on_shutdown();
    }
}

// ============================================================================
// Bring-up helpers
// ============================================================================

fn validation_layer_available(entry: &ash::Entry) -> bool {
    let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
    let found = layers
        .iter()
        .any(|layer| layer.layer_name_as_c_str().map(|name| name == VALIDATION_LAYER).unwrap_or(false));
    if !found {
        sprout_warn!(
            "sprout::vulkan",
            "Validation requested but {} is not installed, continuing without it",
            VALIDATION_LAYER.to_string_lossy()
        );
    }
    found
}

unsafe fn create_instance(
    entry: &ash::Entry,
    display: raw_window_handle::RawDisplayHandle,
    config: &Config,
    validation: bool,
) -> Result<ash::Instance> {
    let app_name = std::ffi::CString::new(config.app_name.clone()).unwrap_or_default();
    let (major, minor, patch) = config.app_version;
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, major, minor, patch))
        .engine_name(c"Sprout")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    let mut extension_names = ash_window::enumerate_required_extensions(display)
        .map_err(|e| {
            sprout_error!("sprout::vulkan", "Failed to get required extensions: {}", e);
            Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
        })?
        .to_vec();

    let layer_names = if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    entry.create_instance(&create_info, None).map_err(|e| {
        sprout_error!("sprout::vulkan", "Failed to create Vulkan instance: {:?}", e);
        Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
    })
}

const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 2] = [ash::khr::swapchain::NAME, ash::khr::push_descriptor::NAME];

/// Pick a Vulkan 1.3 device with dynamic rendering, push descriptors and a
/// queue family doing both graphics and present, preferring discrete GPUs
unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32)> {
    let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
        sprout_error!("sprout::vulkan", "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    let mut best: Option<(vk::PhysicalDevice, u32, bool)> = None;
    for physical_device in physical_devices {
        let properties = instance.get_physical_device_properties(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if properties.api_version < vk::API_VERSION_1_3 {
            sprout_debug!("sprout::vulkan", "Skipping {}: Vulkan 1.3 not supported", name);
            continue;
        }

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();
        let missing = REQUIRED_DEVICE_EXTENSIONS.iter().find(|required| {
            !extensions
                .iter()
                .any(|ext| ext.extension_name_as_c_str().map(|n| n == **required).unwrap_or(false))
        });
        if let Some(missing) = missing {
            sprout_debug!("sprout::vulkan", "Skipping {}: {} missing", name, missing.to_string_lossy());
            continue;
        }

        let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
        let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut features13);
        instance.get_physical_device_features2(physical_device, &mut features2);
        if features13.dynamic_rendering == vk::FALSE {
            sprout_debug!("sprout::vulkan", "Skipping {}: dynamic rendering not supported", name);
            continue;
        }

        let families = instance.get_physical_device_queue_family_properties(physical_device);
        let family = (0..families.len() as u32).find(|&i| {
            families[i as usize].queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
        });
        let Some(family) = family else {
            sprout_debug!("sprout::vulkan", "Skipping {}: no graphics+present queue family", name);
            continue;
        };

        let discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
        match best {
            Some((_, _, true)) => {}
            Some(_) if !discrete => {}
            _ => best = Some((physical_device, family, discrete)),
        }
    }

    best.map(|(device, family, _)| (device, family)).ok_or_else(|| {
        sprout_error!("sprout::vulkan", "No Vulkan 1.3 GPU with push descriptors and presentation found");
        Error::InitializationFailed("No suitable Vulkan GPU found".to_string())
    })
}

unsafe fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(queue_family)
        .queue_priorities(&queue_priorities)];

    let extension_names: Vec<*const std::ffi::c_char> =
        REQUIRED_DEVICE_EXTENSIONS.iter().map(|name| name.as_ptr()).collect();

    let mut features13 = vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true);

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .push_next(&mut features13);

    instance.create_device(physical_device, &create_info, None).map_err(|e| {
        sprout_error!("sprout::vulkan", "Failed to create logical device: {:?}", e);
        Error::InitializationFailed(format!("Failed to create device: {:?}", e))
    })
}
