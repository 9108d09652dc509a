use serde::{Deserialize, Serialize};

/// Type of a shader property exposed to materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Color,
    Vector2,
    Vector3,
    Vector4,
    Float,
    FloatRange,
    IntRange,
    Texture2D,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        Self::Color,
        Self::Vector2,
        Self::Vector3,
        Self::Vector4,
        Self::Float,
        Self::FloatRange,
        Self::IntRange,
        Self::Texture2D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Color => "Color",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Float => "Float",
            Self::FloatRange => "FloatRange",
            Self::IntRange => "IntRange",
            Self::Texture2D => "Texture2D",
        }
    }

    /// Match a type token, ignoring case.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(token))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderProperty {
    pub name: String,
    pub display_name: String,
    pub ty: PropertyType,
}

/// One render pass of a shader, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderPass {
    pub render_mode: String,
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowPass {
    pub vertex: String,
    pub fragment: String,
}

/// A compiled-from-source shader: its material properties plus ordered passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shader {
    pub name: String,
    pub properties: Vec<ShaderProperty>,
    pub passes: Vec<ShaderPass>,
    pub shadow_pass: Option<ShadowPass>,
}

impl Shader {
    pub fn property(&self, name: &str) -> Option<&ShaderProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_type_parse_ignores_case() {
        assert_eq!(PropertyType::parse("color"), Some(PropertyType::Color));
        assert_eq!(PropertyType::parse("TEXTURE2D"), Some(PropertyType::Texture2D));
        assert_eq!(PropertyType::parse("FloatRange"), Some(PropertyType::FloatRange));
        assert_eq!(PropertyType::parse("Matrix"), None);
    }
}
