//! Resource loading for the model viewer.
//!
//! - glTF model loading (meshes, materials, textures)
//! - Image decoding to RGBA8

pub mod error;
pub mod material;
pub mod model;

pub use error::{ResourceError, ResourceResult};
pub use material::Material;
pub use model::{Mesh, Model, TextureData};
