pub mod augmentation;
pub mod correspondence;
pub mod crop;
pub mod dataloader;
pub mod formatting;
pub mod geometric_augmentation;
pub mod geometry;
pub mod image_transformation_augmentation;
pub mod preprocessing;
pub mod sample;
pub mod sampler;
