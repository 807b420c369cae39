use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Original,
    #[default]
    Blur,
    Office,
    Solid,
}

impl Background {
    pub fn as_str(&self) -> &'static str {
        match self {
            Background::Original => "original",
            Background::Blur => "blur",
            Background::Office => "office",
            Background::Solid => "solid",
        }
    }
}

/// Form fields sent alongside the image to `/photos/enhance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoEnhanceParams {
    pub background: Background,
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for PhotoEnhanceParams {
    fn default() -> Self {
        PhotoEnhanceParams {
            background: Background::Blur,
            brightness: 1.1,
            contrast: 1.1,
            sharpness: 1.2,
        }
    }
}

impl PhotoEnhanceParams {
    /// Same bounds the backend enforces; checked before uploading.
    pub fn validate(&self) -> Result<(), String> {
        check_range("brightness", self.brightness, 0.5, 2.0)?;
        check_range("contrast", self.contrast, 0.5, 2.0)?;
        check_range("sharpness", self.sharpness, 0.5, 3.0)
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), String> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} must be between {min} and {max}"))
    }
}
