pub mod aabb;
pub mod mat4;
pub mod quat;
pub mod vec2;
pub mod vec3;
