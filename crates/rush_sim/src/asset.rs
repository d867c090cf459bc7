//! Craft visual representation supplied by the asset loader.
//!
//! The loader either hands over mesh bounds, which get normalized so the
//! longest edge matches a target size and the bounds are centred on the
//! craft origin, or it fails and the placeholder box stands in. Either way
//! the collision proxy is the placeholder box; the mesh is only drawn.

use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_LONGEST_EDGE: f32 = 2.0;

#[derive(Debug, Deserialize, Clone)]
pub struct MeshDescriptor {
    pub mesh_id: String,
    pub min: [f32; 3],
    pub max: [f32; 3],
    #[serde(default = "default_longest_edge")]
    pub longest_edge: f32,
}

/// Placement of a mesh under the craft transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFit {
    pub mesh_id: String,
    pub scale: f32,
    /// Local translation applied after scaling so the bounds are centred.
    pub offset: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CraftVisual {
    Mesh(MeshFit),
    Placeholder,
}

impl CraftVisual {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Mesh(fit) => &fit.mesh_id,
            Self::Placeholder => "placeholder",
        }
    }
}

pub fn fit_mesh(descriptor: &MeshDescriptor) -> MeshFit {
    let min = Vec3::from_array(descriptor.min);
    let max = Vec3::from_array(descriptor.max);
    let size = max - min;
    let longest = size.max_element();
    let longest = if longest > 0.0 { longest } else { 1.0 };
    let scale = descriptor.longest_edge / longest;
    let center = (min + max) * 0.5;
    MeshFit {
        mesh_id: descriptor.mesh_id.clone(),
        scale,
        offset: -center * scale,
    }
}

pub fn load_mesh_descriptor_from_path(path: &Path) -> Result<MeshDescriptor, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let descriptor: MeshDescriptor = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse mesh JSON {}: {e}", path.display()))?;
    validate_descriptor(&descriptor)?;
    Ok(descriptor)
}

fn validate_descriptor(descriptor: &MeshDescriptor) -> Result<(), String> {
    if descriptor.mesh_id.is_empty() {
        return Err("Mesh validation failed: mesh_id is empty".to_string());
    }
    let values = descriptor.min.iter().chain(descriptor.max.iter());
    if values.clone().any(|v| !v.is_finite()) {
        return Err("Mesh validation failed: bounds must be finite".to_string());
    }
    for axis in 0..3 {
        if descriptor.min[axis] > descriptor.max[axis] {
            return Err(format!(
                "Mesh validation failed: min > max on axis {axis} ({} > {})",
                descriptor.min[axis], descriptor.max[axis]
            ));
        }
    }
    if !(descriptor.longest_edge > 0.0) {
        return Err("Mesh validation failed: longest_edge must be > 0".to_string());
    }
    Ok(())
}

/// Resolve the craft visual from an optional descriptor path. Load failures
/// are recovered with the placeholder.
pub fn resolve_craft_visual(path: Option<&Path>) -> CraftVisual {
    let Some(path) = path else {
        return CraftVisual::Placeholder;
    };
    match load_mesh_descriptor_from_path(path) {
        Ok(descriptor) => {
            let fit = fit_mesh(&descriptor);
            log::info!(
                "Craft mesh '{}' fitted (scale {:.3})",
                fit.mesh_id,
                fit.scale
            );
            CraftVisual::Mesh(fit)
        }
        Err(err) => {
            log::warn!("Craft asset unavailable, using placeholder: {err}");
            CraftVisual::Placeholder
        }
    }
}

const fn default_longest_edge() -> f32 {
    DEFAULT_LONGEST_EDGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rush_asset_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn fit_scales_longest_edge_and_centres() {
        let fit = fit_mesh(&MeshDescriptor {
            mesh_id: "plane".to_string(),
            min: [2.0, 0.0, -4.0],
            max: [6.0, 2.0, 4.0],
            longest_edge: 2.0,
        });
        assert!((fit.scale - 0.25).abs() < 1e-6);
        // Scaled centre (4, 1, 0) * 0.25 is cancelled by the offset.
        assert!((fit.offset - Vec3::new(-1.0, -0.25, 0.0)).length() < 1e-6);
    }

    #[test]
    fn degenerate_bounds_do_not_divide_by_zero() {
        let fit = fit_mesh(&MeshDescriptor {
            mesh_id: "point".to_string(),
            min: [1.0, 1.0, 1.0],
            max: [1.0, 1.0, 1.0],
            longest_edge: 2.0,
        });
        assert!(fit.scale.is_finite());
    }

    #[test]
    fn valid_descriptor_resolves_to_mesh() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{ "mesh_id": "plane", "min": [-1, -0.5, -3], "max": [1, 0.5, 3] }"#,
        )
        .expect("write temp file");

        let visual = resolve_craft_visual(Some(&path));
        match visual {
            CraftVisual::Mesh(fit) => {
                assert_eq!(fit.mesh_id, "plane");
                assert!((fit.scale - DEFAULT_LONGEST_EDGE / 6.0).abs() < 1e-6);
            }
            CraftVisual::Placeholder => panic!("expected mesh"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_or_invalid_asset_falls_back() {
        let missing = temp_file_path("missing");
        assert!(resolve_craft_visual(Some(&missing)).is_placeholder());
        assert!(resolve_craft_visual(None).is_placeholder());

        let path = temp_file_path("inverted");
        fs::write(&path, r#"{ "mesh_id": "bad", "min": [1, 0, 0], "max": [0, 1, 1] }"#)
            .expect("write temp file");
        let err = load_mesh_descriptor_from_path(&path).expect_err("inverted bounds");
        assert!(err.contains("min > max"));
        assert!(resolve_craft_visual(Some(&path)).is_placeholder());
        let _ = fs::remove_file(path);
    }
}
