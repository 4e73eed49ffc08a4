//! Integration tests for model loading.

use std::path::Path;

use meshview_resources::{Model, ResourceError};

#[test]
fn load_gltf_model() {
    let model_path = Path::new("../../assets/models/sample/scene.gltf");

    // Skip when assets are not present (e.g. CI checkout without LFS)
    if !model_path.exists() {
        println!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let model = Model::load(model_path).expect("Failed to load glTF model");

    assert!(
        !model.meshes.is_empty(),
        "Model should have at least one mesh"
    );

    for (i, mesh) in model.meshes.iter().enumerate() {
        assert!(
            !mesh.positions.is_empty(),
            "Mesh {} should have positions",
            i
        );
        assert_eq!(
            mesh.normals.len(),
            mesh.positions.len(),
            "Mesh {} should have same number of normals as positions",
            i
        );
        assert_eq!(
            mesh.tex_coords.len(),
            mesh.positions.len(),
            "Mesh {} should have same number of tex coords as positions",
            i
        );
        assert!(!mesh.indices.is_empty(), "Mesh {} should have indices", i);
        if let Some(material) = mesh.material_index {
            assert!(
                material < model.materials.len(),
                "Mesh {} references material {} out of {}",
                i,
                material,
                model.materials.len()
            );
        }
    }

    assert!(
        model.aabb_min.x <= model.aabb_max.x
            && model.aabb_min.y <= model.aabb_max.y
            && model.aabb_min.z <= model.aabb_max.z,
        "AABB min should not exceed max"
    );

    println!(
        "Loaded model: {} meshes, {} vertices, {} triangles, {} materials",
        model.meshes.len(),
        model.total_vertex_count(),
        model.total_triangle_count(),
        model.materials.len()
    );
}

#[test]
fn missing_file_reports_load_error() {
    let result = Model::load(Path::new("does/not/exist.gltf"));
    assert!(matches!(result, Err(ResourceError::GltfLoad { .. })));
}
