// Copyright (C) 2024 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::core::{error::BellandeError, random};
use crate::data::augmentation::{DanAugmentation, PipelineMode};
use crate::data::dataloader::{DataLoader, PairDataset};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

pub mod core;
pub mod data;
pub mod utilities;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const FRAMEWORK_NAME: &str = "Bellande Tracking Augmentation";

pub struct Framework {
    config: utilities::config::Configuration,
    seed: u64,
    initialized: bool,
}

impl Framework {
    pub fn new() -> Result<Self, BellandeError> {
        Framework::from_config(utilities::config::Configuration::default())
    }

    pub fn with_config<P: AsRef<Path>>(config_path: P) -> Result<Self, BellandeError> {
        Framework::from_config(utilities::config::Configuration::from_file(config_path)?)
    }

    pub fn from_config(config: utilities::config::Configuration) -> Result<Self, BellandeError> {
        config.validate()?;
        Ok(Framework {
            config,
            seed: 0,
            initialized: false,
        })
    }

    /// Fixes the base seed, drawing one from the OS when none is configured.
    pub fn initialize(&mut self) -> Result<(), BellandeError> {
        if self.initialized {
            return Ok(());
        }

        self.seed = match self.config.system.seed {
            Some(seed) => seed,
            None => random::from_entropy().gen(),
        };
        log::info!(
            "{} v{} initialized with seed {}",
            FRAMEWORK_NAME,
            VERSION,
            self.seed
        );

        self.initialized = true;
        Ok(())
    }

    pub fn config(&self) -> &utilities::config::Configuration {
        &self.config
    }

    pub fn seed(&self) -> Option<u64> {
        self.initialized.then_some(self.seed)
    }

    pub fn augmentation(&self, mode: PipelineMode) -> Result<DanAugmentation, BellandeError> {
        DanAugmentation::new(&self.config, mode)
    }

    pub fn data_loader(
        &mut self,
        dataset: Arc<dyn PairDataset>,
        mode: PipelineMode,
        batch_size: usize,
        shuffle: bool,
    ) -> Result<DataLoader, BellandeError> {
        self.initialize()?;
        DataLoader::new(
            dataset,
            Arc::new(self.augmentation(mode)?),
            batch_size,
            shuffle,
            self.config.system.num_workers,
            self.seed,
        )
    }

    pub fn get_version() -> &'static str {
        VERSION
    }

    pub fn get_name() -> &'static str {
        FRAMEWORK_NAME
    }

    pub fn system_info() -> String {
        format!(
            "{} v{}\n\
            CPU Threads: {}\n\
            Rayon Threads: {}",
            FRAMEWORK_NAME,
            VERSION,
            num_cpus::get(),
            rayon::current_num_threads(),
        )
    }
}
