//! Single-attempt asset loads. Failures come back as `LoadError`, never panics.

use three_d::*;

use crate::error::LoadError;
use crate::log;


/// A GPU model plus the node transform each part had in the source file,
/// so the pointer tilt can be composed on top of it.
pub struct LoadedModel {
    pub model: Model<PhysicalMaterial>,
    pub base_transforms: Vec<Mat4>,
}


pub async fn load_model(context: &Context, url: &str) -> Result<LoadedModel, LoadError> {
    let fail = |reason: String| LoadError::Model {
        url: url.to_string(),
        reason,
    };

    log!("load_model(): fetching {}", url);
    let mut raw = three_d_asset::io::load_async(&[url])
        .await
        .map_err(|e| fail(e.to_string()))?;
    let cpu_model: CpuModel = raw.deserialize(url).map_err(|e| fail(e.to_string()))?;

    // Model::new only turns triangle primitives into parts
    let base_transforms = cpu_model
        .geometries
        .iter()
        .filter(|p| matches!(p.geometry, three_d_asset::Geometry::Triangles(_)))
        .map(|p| p.transformation)
        .collect::<Vec<_>>();

    let model = Model::<PhysicalMaterial>::new(context, &cpu_model).map_err(|e| fail(e.to_string()))?;
    log!("load_model(): {} parts", base_transforms.len());

    Ok(LoadedModel {
        model,
        base_transforms,
    })
}


/// Loads an equirectangular HDR and turns it into image-based ambient light.
pub async fn load_environment(context: &Context, url: &str) -> Result<AmbientLight, LoadError> {
    let fail = |reason: String| LoadError::Environment {
        url: url.to_string(),
        reason,
    };

    log!("load_environment(): fetching {}", url);
    let mut raw = three_d_asset::io::load_async(&[url])
        .await
        .map_err(|e| fail(e.to_string()))?;
    let texture: CpuTexture = raw.deserialize(url).map_err(|e| fail(e.to_string()))?;

    let skybox = Skybox::new_from_equirectangular(context, &texture);
    Ok(AmbientLight::new_with_environment(
        context,
        1.0,
        Srgba::WHITE,
        skybox.texture(),
    ))
}
