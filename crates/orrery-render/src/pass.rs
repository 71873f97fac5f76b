//! Render passes: the scene pass clears colour and reverse-Z depth, the
//! overlay pass draws over a finished frame.

use crate::depth::DepthBuffer;

/// Near-black backdrop behind the orrery.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.004,
    g: 0.004,
    b: 0.012,
    a: 1.0,
};

/// Begin a pass that clears colour to `clear` and depth to the far plane.
pub fn begin_scene_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    color_view: &'encoder wgpu::TextureView,
    depth: &'encoder DepthBuffer,
    clear: wgpu::Color,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("orrery-scene-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

/// Begin a pass over `color_view` that keeps its contents and the scene depth.
pub fn begin_overlay_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    color_view: &'encoder wgpu::TextureView,
    depth: &'encoder DepthBuffer,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("orrery-overlay-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
