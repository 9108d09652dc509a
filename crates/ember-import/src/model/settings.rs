use serde::{Deserialize, Serialize};

use super::postprocess::PostProcessSteps;

/// Model import options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelImportSettings {
    pub generate_normals: bool,
    /// Only used together with `generate_normals`.
    pub generate_smooth_normals: bool,
    pub calculate_tangent_space: bool,
    pub make_left_handed: bool,
    pub flip_uvs: bool,
    pub optimize_meshes: bool,
    pub flip_winding_order: bool,
    pub weld_vertices: bool,
    pub invert_normals: bool,
    pub global_scale: bool,
    /// Factor applied to the root transform when `global_scale` is set.
    pub global_scale_factor: f32,
    /// Uniform scale written to the root node's local scale.
    pub unit_scale: f32,
}

impl Default for ModelImportSettings {
    fn default() -> Self {
        Self {
            generate_normals: true,
            generate_smooth_normals: false,
            calculate_tangent_space: true,
            make_left_handed: true,
            flip_uvs: false,
            optimize_meshes: false,
            flip_winding_order: false,
            weld_vertices: false,
            invert_normals: false,
            global_scale: false,
            global_scale_factor: 1.0,
            unit_scale: 1.0,
        }
    }
}

impl ModelImportSettings {
    /// Steps to run on the loaded scene.
    pub fn post_process_steps(&self) -> PostProcessSteps {
        let mut steps = PostProcessSteps::LIMIT_BONE_WEIGHTS
            | PostProcessSteps::GENERATE_UV_COORDS
            | PostProcessSteps::TRIANGULATE;

        if self.generate_normals && self.generate_smooth_normals {
            steps |= PostProcessSteps::GENERATE_SMOOTH_NORMALS;
        } else if self.generate_normals {
            steps |= PostProcessSteps::GENERATE_NORMALS;
        }

        let toggles = [
            (self.calculate_tangent_space, PostProcessSteps::CALCULATE_TANGENT_SPACE),
            (self.make_left_handed, PostProcessSteps::MAKE_LEFT_HANDED),
            (self.flip_uvs, PostProcessSteps::FLIP_UVS),
            (self.optimize_meshes, PostProcessSteps::OPTIMIZE_MESHES),
            (self.flip_winding_order, PostProcessSteps::FLIP_WINDING_ORDER),
            (self.weld_vertices, PostProcessSteps::JOIN_IDENTICAL_VERTICES),
            (self.invert_normals, PostProcessSteps::INVERT_NORMALS),
            (self.global_scale, PostProcessSteps::GLOBAL_SCALE),
        ];
        for (enabled, step) in toggles {
            if enabled {
                steps |= step;
            }
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_steps() {
        let steps = ModelImportSettings::default().post_process_steps();
        assert_eq!(
            steps,
            PostProcessSteps::LIMIT_BONE_WEIGHTS
                | PostProcessSteps::GENERATE_UV_COORDS
                | PostProcessSteps::TRIANGULATE
                | PostProcessSteps::GENERATE_NORMALS
                | PostProcessSteps::CALCULATE_TANGENT_SPACE
                | PostProcessSteps::MAKE_LEFT_HANDED
        );
    }

    #[test]
    fn smooth_normals_need_generate_normals() {
        let mut settings = ModelImportSettings {
            generate_smooth_normals: true,
            ..Default::default()
        };
        let steps = settings.post_process_steps();
        assert!(steps.contains(PostProcessSteps::GENERATE_SMOOTH_NORMALS));
        assert!(!steps.contains(PostProcessSteps::GENERATE_NORMALS));

        settings.generate_normals = false;
        let steps = settings.post_process_steps();
        assert!(!steps.intersects(PostProcessSteps::GENERATE_NORMALS | PostProcessSteps::GENERATE_SMOOTH_NORMALS));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let settings: ModelImportSettings = toml::from_str("flip_uvs = true\nunit_scale = 0.01").unwrap();
        assert!(settings.flip_uvs);
        assert!(settings.generate_normals);
        assert!(settings.make_left_handed);
        assert_eq!(settings.unit_scale, 0.01);
        assert_eq!(settings.global_scale_factor, 1.0);
    }
}
