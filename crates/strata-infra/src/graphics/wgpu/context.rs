// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{anyhow, Result};
use wgpu::{Features, Instance};

/// How the `wgpu` backend picks and labels its device.
#[derive(Debug, Clone)]
pub struct WgpuBackendConfig {
    /// Adapter preference passed to `wgpu`.
    pub power_preference: wgpu::PowerPreference,
    /// Debug label of the logical device.
    pub label: String,
}

impl Default for WgpuBackendConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            label: "Strata Logical Device".to_owned(),
        }
    }
}

/// Holds the core WGPU state objects required for rendering.
/// Strata renders into textures it is handed, so the context owns no surface.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_device_type: wgpu::DeviceType,
    pub active_device_features: wgpu::Features,
}

impl WgpuGraphicsContext {
    /// Asynchronously requests an adapter and a logical device.
    ///
    /// ## Arguments
    /// * `config` - Adapter preference and device label.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or an error if no adapter or device is available.
    pub async fn new_headless(config: &WgpuBackendConfig) -> Result<Self> {
        log::info!("Initializing headless WGPU graphics context...");

        // --- 1. Pick an adapter ---
        let instance = Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a suitable adapter: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // --- 2. Create Logical Device and Command Queue from Adapter ---
        // Decal tiling uses a transparent border when the adapter has one.
        let optional_features: Features = wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER;
        let features_to_enable: Features = adapter.features() & optional_features;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(&config.label),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let active_device_features = device.features();
        log::debug!("Active device features: {active_device_features:?}");

        Ok(WgpuGraphicsContext {
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            active_device_features,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Whether samplers can clamp to a transparent border.
    pub fn supports_clamp_to_border(&self) -> bool {
        self.active_device_features
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
    }
}
