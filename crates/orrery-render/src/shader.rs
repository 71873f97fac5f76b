//! Registry of the statically authored WGSL programs.
//!
//! Programs are registered once by the render bootstrap and looked up by
//! name afterwards; registering the same name twice is an error.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` under `name`.
    pub fn register(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        if self.modules.contains_key(name) {
            return Err(ShaderError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        debug!("Compiling shader '{}' ({} bytes)", name, source.len());
        let module = Arc::new(device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        }));
        self.modules.insert(name.to_string(), module.clone());
        info!("Registered shader '{}'", name);
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SHADER: &str = r#"
        @vertex
        fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.0, 1.0);
        }
    "#;

    fn create_test_device() -> Option<wgpu::Device> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            let (device, _queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()?;
            Some(device)
        })
    }

    #[test]
    fn test_library_starts_empty() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(matches!(library.get("voxel"), Err(ShaderError::NotLoaded { .. })));
    }

    #[test]
    fn test_register_then_get_returns_same_module() {
        let Some(device) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        let registered = library.register(&device, "voxel", VALID_SHADER).unwrap();
        let fetched = library.get("voxel").unwrap();
        assert!(Arc::ptr_eq(&registered, &fetched));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_second_registration_is_rejected() {
        let Some(device) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library.register(&device, "planet", VALID_SHADER).unwrap();
        let again = library.register(&device, "planet", VALID_SHADER);
        assert!(matches!(again, Err(ShaderError::AlreadyRegistered { .. })));
        assert_eq!(library.len(), 1);
    }
}
