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

use crate::core::error::BellandeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub augmentation: AugmentationConfig,
    pub datasets: DatasetConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Per-channel mean in BGR order, also used to fill expanded canvases.
    pub mean_pixel: Vec<f32>,
    pub max_expand: f32,
    /// Chance that a training sample is placed on an expanded canvas.
    pub expand_probability: f32,
    pub lower_contrast: f32,
    pub upper_contrast: f32,
    pub lower_saturation: f32,
    pub upper_saturation: f32,
    pub brightness_delta: f32,
    pub hue_delta: f32,
    /// Box jitter range as a fraction of box extent.
    pub lower_offset: f32,
    pub upper_offset: f32,
    pub strict_overlap: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub image_size: usize,
    pub max_object: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub num_workers: usize,
    pub seed: Option<u64>,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        AugmentationConfig {
            mean_pixel: vec![104.0, 117.0, 123.0],
            max_expand: 1.2,
            expand_probability: 0.5,
            lower_contrast: 0.7,
            upper_contrast: 1.5,
            lower_saturation: 0.7,
            upper_saturation: 1.5,
            brightness_delta: 32.0,
            hue_delta: 18.0,
            lower_offset: 0.0,
            upper_offset: 0.2,
            strict_overlap: false,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            image_size: 900,
            max_object: 80,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            num_workers: num_cpus::get(),
            seed: None,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            augmentation: AugmentationConfig::default(),
            datasets: DatasetConfig::default(),
            system: SystemConfig::default(),
        }
    }
}

fn check_range(name: &str, lower: f32, upper: f32) -> Result<(), BellandeError> {
    if !(lower >= 0.0) {
        return Err(BellandeError::InvalidConfiguration(format!(
            "lower {} must be non-negative, got {}",
            name, lower
        )));
    }
    if !(upper >= lower) {
        return Err(BellandeError::InvalidConfiguration(format!(
            "upper {} ({}) must not be below lower {} ({})",
            name, upper, name, lower
        )));
    }
    Ok(())
}

impl Configuration {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BellandeError> {
        let content = fs::read_to_string(path)?;
        Configuration::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BellandeError> {
        let config: Configuration = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, BellandeError> {
        let config: Configuration = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BellandeError> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BellandeError> {
        let aug = &self.augmentation;

        if aug.mean_pixel.is_empty() || aug.mean_pixel.iter().any(|m| !m.is_finite()) {
            return Err(BellandeError::InvalidConfiguration(
                "mean_pixel must hold one finite value per channel".to_string(),
            ));
        }

        if !(aug.max_expand >= 1.0) || !aug.max_expand.is_finite() {
            return Err(BellandeError::InvalidConfiguration(format!(
                "max_expand must be a finite ratio of at least 1, got {}",
                aug.max_expand
            )));
        }

        if !(0.0..=1.0).contains(&aug.expand_probability) {
            return Err(BellandeError::InvalidConfiguration(format!(
                "expand_probability must be between 0 and 1, got {}",
                aug.expand_probability
            )));
        }

        check_range("contrast", aug.lower_contrast, aug.upper_contrast)?;
        check_range("saturation", aug.lower_saturation, aug.upper_saturation)?;
        check_range("offset", aug.lower_offset, aug.upper_offset)?;

        if !(0.0..=255.0).contains(&aug.brightness_delta) {
            return Err(BellandeError::InvalidConfiguration(format!(
                "brightness_delta must be between 0 and 255, got {}",
                aug.brightness_delta
            )));
        }

        if !(0.0..=360.0).contains(&aug.hue_delta) {
            return Err(BellandeError::InvalidConfiguration(format!(
                "hue_delta must be between 0 and 360, got {}",
                aug.hue_delta
            )));
        }

        if self.datasets.image_size == 0 {
            return Err(BellandeError::InvalidConfiguration(
                "image_size must be greater than 0".to_string(),
            ));
        }

        if self.datasets.max_object == 0 {
            return Err(BellandeError::InvalidConfiguration(
                "max_object must be greater than 0".to_string(),
            ));
        }

        if self.system.num_workers == 0 {
            return Err(BellandeError::InvalidConfiguration(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
