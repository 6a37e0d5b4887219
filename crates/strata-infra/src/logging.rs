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

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g. `"info"` or
/// `"strata_core=debug,wgpu_core=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger.
///
/// The filter comes from `config.env_filter`, then `RUST_LOG`, then defaults to `info`.
/// Only the first call has an effect. If the host already installed a logger the
/// call is a no-op as well.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder
                    .filter_level(log::LevelFilter::Info)
                    .filter_module("wgpu_hal", log::LevelFilter::Error);
            }
        }
        builder.write_style(config.write_style);

        if builder.try_init().is_err() {
            log::debug!("A logger was already installed; keeping it");
            return;
        }
        log::debug!("Logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging(LoggingConfig {
            env_filter: Some("debug".into()),
            ..Default::default()
        });
        init_logging(LoggingConfig::default());
        log::info!("still logging");
    }
}
