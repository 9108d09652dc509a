use std::collections::BTreeMap;

use ember_core::Color;

use crate::handle::AssetRef;
use crate::shader::Shader;
use crate::texture::Texture2D;

/// Shader plus the property values a renderer binds for it.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub shader: AssetRef<Shader>,
    pub colors: BTreeMap<String, Color>,
    pub floats: BTreeMap<String, f32>,
    pub textures: BTreeMap<String, AssetRef<Texture2D>>,
}

impl Material {
    pub fn new(name: impl Into<String>, shader: AssetRef<Shader>) -> Self {
        Self {
            name: name.into(),
            shader,
            colors: BTreeMap::new(),
            floats: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }

    pub fn set_color(&mut self, name: &str, color: Color) {
        self.colors.insert(name.to_string(), color);
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_string(), value);
    }

    pub fn set_texture(&mut self, name: &str, texture: AssetRef<Texture2D>) {
        self.textures.insert(name.to_string(), texture);
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn texture(&self, name: &str) -> Option<&AssetRef<Texture2D>> {
        self.textures.get(name)
    }
}
