//! Data exchanged with a presentation front end. Field order is part of the
//! contract and must stay stable.

use glam::{Mat4, UVec2, Vec3};

use crate::framebuffer::FrameBufferFormat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInput {
    pub window_size: UVec2,
    pub modelview: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub color_buffer: Vec<u8>,
    pub depth_buffer: Vec<f32>,
    pub color_buffer_format: FrameBufferFormat,
}

impl RenderInput {
    pub fn from_camera(camera: &crate::camera::Camera, window_size: UVec2) -> Self {
        Self {
            window_size,
            modelview: camera.view_matrix(),
            projection: camera.projection_matrix(0.01, 1000.0),
            position: camera.position,
            target: camera.target,
            up: camera.up,
        }
    }
}
