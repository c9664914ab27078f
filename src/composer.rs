//! Postprocessing chain: the scene is drawn into an offscreen colour buffer,
//! then full-screen shader passes ping-pong between two buffers and the last
//! pass writes to the canvas.

use three_d::*;

use crate::config::PostSettings;
use crate::error::{StageError, StageResult};
use crate::log;
use crate::viewport::{RenderSurface, SurfaceSize};


const FULLSCREEN_VERT: &str = r#"#version 300 es
    precision highp float;

    out vec2 uv;

    void main() {
        // one oversized triangle, no vertex buffer
        vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2));
        uv = p;
        gl_Position = vec4(p * 2.0 - 1.0, 0.0, 1.0);
    }
"#;

const RGB_SHIFT_FRAG: &str = r#"#version 300 es
    precision highp float;

    uniform sampler2D tDiffuse;
    uniform float amount;
    uniform float angle;

    in vec2 uv;
    out vec4 fragColor;

    void main() {
        vec2 offset = amount * vec2(cos(angle), sin(angle));
        vec4 cr = texture(tDiffuse, uv + offset);
        vec4 cga = texture(tDiffuse, uv);
        vec4 cb = texture(tDiffuse, uv - offset);
        fragColor = vec4(cr.r, cga.g, cb.b, cga.a);
    }
"#;

const OUTPUT_FRAG: &str = r#"#version 300 es
    precision highp float;

    uniform sampler2D tDiffuse;
    uniform float exposure;

    in vec2 uv;
    out vec4 fragColor;

    vec3 rrt_and_odt_fit(vec3 v) {
        vec3 a = v * (v + 0.0245786) - 0.000090537;
        vec3 b = v * (0.983729 * v + 0.4329510) + 0.238081;
        return a / b;
    }

    // ACES filmic fit (Stephen Hill)
    vec3 aces_filmic(vec3 color) {
        const mat3 input_mat = mat3(
            vec3(0.59719, 0.07600, 0.02840),
            vec3(0.35458, 0.90834, 0.13383),
            vec3(0.04823, 0.01566, 0.83777)
        );
        const mat3 output_mat = mat3(
            vec3( 1.60475, -0.10208, -0.00327),
            vec3(-0.53108,  1.10813, -0.07276),
            vec3(-0.07367, -0.00605,  1.07602)
        );
        color *= exposure / 0.6;
        color = input_mat * color;
        color = rrt_and_odt_fit(color);
        color = output_mat * color;
        return clamp(color, 0.0, 1.0);
    }

    vec3 linear_to_srgb(vec3 c) {
        return mix(
            pow(c, vec3(0.41666)) * 1.055 - vec3(0.055),
            c * 12.92,
            vec3(lessThanEqual(c, vec3(0.0031308)))
        );
    }

    void main() {
        vec4 color = texture(tDiffuse, uv);
        fragColor = vec4(linear_to_srgb(aces_filmic(color.rgb)), color.a);
    }
"#;


/// A full-screen fragment shader reading the previous pass from `tDiffuse`.
pub struct ShaderPass {
    name: &'static str,
    program: context::Program,
    u_input: Option<context::UniformLocation>,
    uniforms: Vec<(&'static str, Option<context::UniformLocation>, f32)>,
}
impl ShaderPass {
    pub fn new(
        gl: &Context,
        name: &'static str,
        fragment_source: &str,
        uniforms: &[(&'static str, f32)],
    ) -> StageResult<Self> {
        let program = create_glsl_program(gl, FULLSCREEN_VERT, fragment_source)?;
        let (u_input, uniforms) = unsafe {
            (
                gl.get_uniform_location(program, "tDiffuse"),
                uniforms
                    .iter()
                    .map(|&(n, v)| (n, gl.get_uniform_location(program, n), v))
                    .collect(),
            )
        };
        Ok(Self {
            name,
            program,
            u_input,
            uniforms,
        })
    }


    pub fn name(&self) -> &'static str {
        self.name
    }


    /// Draws into whatever framebuffer is bound.
    fn draw(&self, gl: &Context, input: context::Texture) {
        unsafe {
            gl.use_program(Some(self.program));
            {
                gl.active_texture(context::TEXTURE0);
                gl.bind_texture(context::TEXTURE_2D, Some(input));
                gl.uniform_1_i32(self.u_input.as_ref(), 0);
                for (_, location, value) in &self.uniforms {
                    gl.uniform_1_f32(location.as_ref(), *value);
                }
                gl.draw_arrays(context::TRIANGLES, 0, 3);
            }
            gl.use_program(None);
        }
    }
}


#[derive(Clone, Copy)]
struct ColorBuffer {
    texture: context::Texture,
    framebuffer: context::Framebuffer,
}


pub struct EffectComposer {
    gl: Context,
    width: u32,
    height: u32,
    float_targets: bool,
    buffers: Vec<ColorBuffer>,
    depth: Option<context::Renderbuffer>,
    vao: context::VertexArray,
    passes: Vec<ShaderPass>,
}
impl EffectComposer {
    pub fn new(gl: &Context) -> StageResult<Self> {
        let float_targets = gl.supported_extensions().contains("EXT_color_buffer_float");
        if !float_targets {
            log!("EffectComposer::new(): WARNING: EXT_color_buffer_float missing, using 8-bit targets.");
        }
        let vao = unsafe { gl.create_vertex_array() }.map_err(StageError::WebGl)?;

        let mut composer = Self {
            gl: gl.clone(),
            width: 0,
            height: 0,
            float_targets,
            buffers: Vec::new(),
            depth: None,
            vao,
            passes: Vec::new(),
        };
        composer.allocate(1, 1)?;
        Ok(composer)
    }


    /// Scene pass, RGB shift, then tone mapping to the canvas.
    pub fn with_default_passes(gl: &Context, post: &PostSettings) -> StageResult<Self> {
        let mut composer = Self::new(gl)?;
        composer.add_pass(ShaderPass::new(
            gl,
            "rgb_shift",
            RGB_SHIFT_FRAG,
            &[("amount", post.rgb_shift_amount), ("angle", post.rgb_shift_angle)],
        )?);
        composer.add_pass(ShaderPass::new(
            gl,
            "output",
            OUTPUT_FRAG,
            &[("exposure", post.exposure)],
        )?);
        Ok(composer)
    }


    pub fn add_pass(&mut self, pass: ShaderPass) {
        log!("EffectComposer::add_pass(): {}", pass.name());
        self.passes.push(pass);
    }


    /// Produces one frame. `draw_scene` runs with the offscreen buffer bound,
    /// cleared to transparent.
    pub fn render(&mut self, draw_scene: impl FnOnce()) {
        // a failed reallocation leaves nothing to draw into
        if self.buffers.len() < 2 {
            return;
        }
        let gl = &self.gl;
        let (w, h) = (self.width as i32, self.height as i32);
        let mut read = 0usize;

        unsafe {
            gl.bind_framebuffer(context::FRAMEBUFFER, Some(self.buffers[read].framebuffer));
            gl.viewport(0, 0, w, h);
            gl.depth_mask(true);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(context::COLOR_BUFFER_BIT | context::DEPTH_BUFFER_BIT);
        }

        draw_scene();

        unsafe {
            gl.disable(context::DEPTH_TEST);
            gl.disable(context::BLEND);
            gl.disable(context::CULL_FACE);
            gl.bind_vertex_array(Some(self.vao));

            let last = self.passes.len().saturating_sub(1);
            for (i, pass) in self.passes.iter().enumerate() {
                let target = if i == last {
                    None
                } else {
                    Some(self.buffers[1 - read].framebuffer)
                };
                gl.bind_framebuffer(context::FRAMEBUFFER, target);
                gl.viewport(0, 0, w, h);
                pass.draw(gl, self.buffers[read].texture);
                read = 1 - read;
            }

            if self.passes.is_empty() {
                gl.bind_framebuffer(context::READ_FRAMEBUFFER, Some(self.buffers[read].framebuffer));
                gl.bind_framebuffer(context::DRAW_FRAMEBUFFER, None);
                gl.blit_framebuffer(0, 0, w, h, 0, 0, w, h, context::COLOR_BUFFER_BIT, context::NEAREST);
            }

            gl.bind_vertex_array(None);
            gl.bind_texture(context::TEXTURE_2D, None);
            gl.bind_framebuffer(context::FRAMEBUFFER, None);
        }
    }


    fn allocate(&mut self, width: u32, height: u32) -> StageResult<()> {
        self.release();
        let gl = &self.gl;
        let (internal_format, data_type) = if self.float_targets {
            (context::RGBA16F, context::HALF_FLOAT)
        } else {
            (context::RGBA8, context::UNSIGNED_BYTE)
        };

        unsafe {
            let depth = gl.create_renderbuffer().map_err(StageError::WebGl)?;
            gl.bind_renderbuffer(context::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(context::RENDERBUFFER, context::DEPTH_COMPONENT24, width as i32, height as i32);
            gl.bind_renderbuffer(context::RENDERBUFFER, None);
            self.depth = Some(depth);

            for _ in 0..2 {
                let texture = gl.create_texture().map_err(StageError::WebGl)?;
                gl.bind_texture(context::TEXTURE_2D, Some(texture));
                gl.tex_image_2d(
                    context::TEXTURE_2D,
                    0,
                    internal_format as i32,
                    width as i32,
                    height as i32,
                    0,
                    context::RGBA,
                    data_type,
                    None,
                );
                gl.tex_parameter_i32(context::TEXTURE_2D, context::TEXTURE_MIN_FILTER, context::LINEAR as i32);
                gl.tex_parameter_i32(context::TEXTURE_2D, context::TEXTURE_MAG_FILTER, context::LINEAR as i32);
                gl.tex_parameter_i32(context::TEXTURE_2D, context::TEXTURE_WRAP_S, context::CLAMP_TO_EDGE as i32);
                gl.tex_parameter_i32(context::TEXTURE_2D, context::TEXTURE_WRAP_T, context::CLAMP_TO_EDGE as i32);

                let framebuffer = gl.create_framebuffer().map_err(StageError::WebGl)?;
                gl.bind_framebuffer(context::FRAMEBUFFER, Some(framebuffer));
                gl.framebuffer_texture_2d(
                    context::FRAMEBUFFER,
                    context::COLOR_ATTACHMENT0,
                    context::TEXTURE_2D,
                    Some(texture),
                    0,
                );
                gl.framebuffer_renderbuffer(
                    context::FRAMEBUFFER,
                    context::DEPTH_ATTACHMENT,
                    context::RENDERBUFFER,
                    Some(depth),
                );
                let status = gl.check_framebuffer_status(context::FRAMEBUFFER);
                gl.bind_framebuffer(context::FRAMEBUFFER, None);
                gl.bind_texture(context::TEXTURE_2D, None);

                self.buffers.push(ColorBuffer { texture, framebuffer });
                if status != context::FRAMEBUFFER_COMPLETE {
                    return Err(StageError::WebGl(format!(
                        "offscreen framebuffer incomplete (0x{:x}) at {}x{}",
                        status, width, height
                    )));
                }
            }
        }

        self.width = width;
        self.height = height;
        Ok(())
    }


    fn release(&mut self) {
        let gl = &self.gl;
        unsafe {
            for buffer in self.buffers.drain(..) {
                gl.delete_framebuffer(buffer.framebuffer);
                gl.delete_texture(buffer.texture);
            }
            if let Some(depth) = self.depth.take() {
                gl.delete_renderbuffer(depth);
            }
        }
    }
}
impl RenderSurface for EffectComposer {
    fn set_size(&mut self, size: SurfaceSize) {
        let (width, height) = size.physical();
        if (width, height) == (self.width, self.height) {
            return;
        }
        if let Err(e) = self.allocate(width, height) {
            crate::error!("EffectComposer::set_size(): {}", e);
        }
    }
}
impl Drop for EffectComposer {
    fn drop(&mut self) {
        self.release();
        unsafe {
            for pass in &self.passes {
                self.gl.delete_program(pass.program);
            }
            self.gl.delete_vertex_array(self.vao);
        }
    }
}


fn create_glsl_program(
    gl: &Context,
    vs_source: &str,
    fs_source: &str,
) -> StageResult<context::Program> {
    unsafe {
        let vert_shader = gl.create_shader(context::VERTEX_SHADER).map_err(StageError::Shader)?;
        let frag_shader = gl.create_shader(context::FRAGMENT_SHADER).map_err(StageError::Shader)?;

        gl.shader_source(vert_shader, vs_source);
        gl.shader_source(frag_shader, fs_source);
        gl.compile_shader(vert_shader);
        gl.compile_shader(frag_shader);

        let id = gl.create_program().map_err(StageError::Shader)?;

        gl.attach_shader(id, vert_shader);
        gl.attach_shader(id, frag_shader);
        gl.link_program(id);

        if !gl.get_program_link_status(id) {
            let log = [
                gl.get_shader_info_log(vert_shader),
                gl.get_shader_info_log(frag_shader),
                gl.get_program_info_log(id),
            ]
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
            gl.delete_program(id);
            gl.delete_shader(vert_shader);
            gl.delete_shader(frag_shader);
            return Err(StageError::Shader(log));
        }

        gl.detach_shader(id, vert_shader);
        gl.detach_shader(id, frag_shader);
        gl.delete_shader(vert_shader);
        gl.delete_shader(frag_shader);
        Ok(id)
    }
}
