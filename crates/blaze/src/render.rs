//! # Render: The Drawing Boundary
//!
//! The runtime never touches pixels. Scenes describe a frame by calling a
//! [`Renderer`], and the host decides what that means: a canvas, a GPU batch,
//! or, with [`CommandBuffer`], a plain list of [`DrawCommand`]s.
//!
//! ```text
//! Scene::on_render(view, renderer)
//!     │
//!     ├── draw_rect / draw_text / draw_image    world space, camera applied
//!     └── draw_screen_rect                      screen space (HUD), no camera
//!                │
//!                ▼
//!        Renderer impl (host)   ──▶  flush / present
//! ```
//!
//! Coordinates follow [`crate::math`]: origin top-left, `y` down.

use crate::asset::ImageHandle;
use crate::math::{Rect, Vec2};

/// An RGBA color with floating-point components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::rgba(0.0, 0.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from RGB (alpha = 1).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from a `0xRRGGBB` literal.
    pub fn hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// The same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How a rectangle is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RectStyle {
    #[default]
    Filled,
    /// Outline with the given line width.
    Stroke(f32),
}

/// Horizontal text alignment relative to the draw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub font_size: f32,
    pub align: Align,
}

impl TextStyle {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            ..Self::default()
        }
    }

    /// Set the text color.
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            font_size: 16.0,
            align: Align::Left,
        }
    }
}

/// Drawing surface implemented by the host.
pub trait Renderer {
    /// Draw a rectangle in world space.
    fn draw_rect(&mut self, rect: Rect, color: Color, style: RectStyle);

    /// Draw a line of text in world space; `position` is the baseline anchor.
    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle);

    /// Draw a rectangle in screen space, ignoring any camera.
    fn draw_screen_rect(&mut self, rect: Rect, color: Color, style: RectStyle);

    /// Draw an image stretched over `dest`, multiplied by `tint`.
    ///
    /// Renderers without image support get a filled rect in the tint color.
    fn draw_image(&mut self, image: &ImageHandle, dest: Rect, tint: Color) {
        let _ = image;
        self.draw_rect(dest, tint, RectStyle::Filled);
    }
}

// ── CommandBuffer ────────────────────────────────────────────────────────

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        color: Color,
        style: RectStyle,
    },
    Text {
        text: String,
        position: Vec2,
        style: TextStyle,
    },
    ScreenRect {
        rect: Rect,
        color: Color,
        style: RectStyle,
    },
    Image {
        image: ImageHandle,
        dest: Rect,
        tint: Color,
    },
}

/// A [`Renderer`] that records commands instead of drawing.
///
/// World-space commands are shifted by `-camera` as they are recorded, so the
/// buffer holds screen coordinates ready for a host to replay.
#[derive(Debug, Default, Clone)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
    camera: Vec2,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the top-left world position shown at the screen origin.
    pub fn set_camera(&mut self, camera: Vec2) {
        self.camera = camera;
    }

    pub fn camera(&self) -> Vec2 {
        self.camera
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hand the recorded commands to the caller and start a new list.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn to_screen(&self, rect: Rect) -> Rect {
        rect.translated(-self.camera)
    }
}

impl Renderer for CommandBuffer {
    fn draw_rect(&mut self, rect: Rect, color: Color, style: RectStyle) {
        let rect = self.to_screen(rect);
        self.commands.push(DrawCommand::Rect { rect, color, style });
    }

    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            position: position - self.camera,
            style: *style,
        });
    }

    fn draw_screen_rect(&mut self, rect: Rect, color: Color, style: RectStyle) {
        self.commands
            .push(DrawCommand::ScreenRect { rect, color, style });
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect, tint: Color) {
        let dest = self.to_screen(dest);
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            dest,
            tint,
        });
    }
}
