//! Software-rendered preview using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            · backdrop ·        ★                         │
//! │                 ·  tree / exploded cloud  ·   [card]     │
//! │        [card]        garland spiral            +cursor   │
//! │                                                          │
//! │  status bar                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! While a resource is held the whole window is covered by a preview
//! panel naming it.

use std::sync::mpsc::Sender;

use glam::{Vec2, Vec3};
use hand_gesture::Handedness;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tree_field::Star;

use crate::camera::Camera;
use crate::engine::{EngineStatus, FrameStats, RenderPayload};
use crate::error::EngineError;
use crate::selection::{ResourceStatus, SelectableObject};
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:        usize = 960;
pub const WIN_H:        usize = 540;
const STATUS_H:         usize = 30;
const BG_COLOR:         u32   = 0xFF05070F;
const TEXT_BG:          u32   = 0xFF0F1A30;
const GARLAND_COLOR:    u32   = 0xFFFFCC00;
const STAR_COLOR:       u32   = 0xFFFFD700;
const CARD_BORDER:      u32   = 0xFFFFFFFF;
const HOVER_BORDER:     u32   = 0xFFFFCC33;
const PLACEHOLDER_A:    u32   = 0xFF444444;
const PLACEHOLDER_B:    u32   = 0xFF666666;
const CARD_FILL:        u32   = 0xFF8899AA;
const CURSOR_COLOR:     u32   = 0xFF66FFCC;
const PINCH_COLOR:      u32   = 0xFFFF6666;

// ════════════════════════════════════════════════════════════════════════════
// Canvas: window-independent pixel buffer
// ════════════════════════════════════════════════════════════════════════════

/// ARGB framebuffer with the drawing primitives.
pub struct Canvas {
    pub w:   usize,
    pub h:   usize,
    pub buf: Vec<u32>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { w, h, buf: vec![BG_COLOR; w * h] }
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    /// NDC (`y` up) → pixel coordinates, possibly off-canvas.
    pub fn ndc_to_pixel(&self, ndc: Vec2) -> (isize, isize) {
        let x = (ndc.x + 1.0) * 0.5 * self.w as f32;
        let y = (1.0 - ndc.y) * 0.5 * self.h as f32;
        (x.floor() as isize, y.floor() as isize)
    }

    /// Render one engine frame.
    pub fn draw_frame(
        &mut self,
        payload: &RenderPayload,
        camera:  &Camera,
        status:  &EngineStatus,
        stats:   &FrameStats,
    ) {
        self.clear(BG_COLOR);

        // ── Backdrop ──────────────────────────────────────────────────────
        for p in &payload.backdrop {
            if let Some(proj) = camera.project(p.position) {
                let (x, y) = self.ndc_to_pixel(proj.ndc);
                self.set_pixel_i(x, y, rgb_to_argb(p.color));
            }
        }

        // ── Entities, far to near ─────────────────────────────────────────
        let mut splats: Vec<(f32, isize, isize, isize, u32)> = payload
            .entities
            .iter()
            .filter_map(|e| {
                let proj = camera.project(e.position)?;
                let (x, y) = self.ndc_to_pixel(proj.ndc);
                let r = self.world_to_px(camera, e.scale, proj.depth).max(1);
                Some((proj.depth, x, y, r, rgb_to_argb(e.color)))
            })
            .collect();
        splats.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, x, y, r, color) in splats {
            self.fill_disc(x, y, r, color);
        }

        // ── Garland ───────────────────────────────────────────────────────
        for &p in &payload.garland {
            if let Some(proj) = camera.project(p) {
                let (x, y) = self.ndc_to_pixel(proj.ndc);
                self.set_pixel_i(x, y, GARLAND_COLOR);
                self.set_pixel_i(x + 1, y, GARLAND_COLOR);
            }
        }

        // ── Star ──────────────────────────────────────────────────────────
        let star = &payload.star;
        let turn = star.rotation();
        let outline: Vec<(isize, isize)> = Star::outline()
            .into_iter()
            .filter_map(|v| camera.project(star.position + turn * v.extend(0.0)))
            .map(|proj| self.ndc_to_pixel(proj.ndc))
            .collect();
        if outline.len() == Star::POINTS * 2 {
            for (i, &from) in outline.iter().enumerate() {
                self.draw_line(from, outline[(i + 1) % outline.len()], STAR_COLOR);
            }
        }

        // ── Ornament cards ────────────────────────────────────────────────
        let mut cards: Vec<&SelectableObject> = payload.ornaments.iter().collect();
        cards.sort_by(|a, b| a.pose.position.z.total_cmp(&b.pose.position.z));
        for card in cards {
            self.draw_card(card, camera);
        }

        // ── Cursor ────────────────────────────────────────────────────────
        let right = payload.hands.right;
        if right.detected {
            let (x, y) = self.ndc_to_pixel(right.position);
            let color = if right.is_pinching { PINCH_COLOR } else { CURSOR_COLOR };
            for d in -8..=8 {
                self.set_pixel_i(x + d, y, color);
                self.set_pixel_i(x, y + d, color);
            }
        }

        // ── Preview panel ─────────────────────────────────────────────────
        if let Some(held) = &payload.selection.held {
            self.draw_preview(held, payload);
        }

        // ── Status bar ────────────────────────────────────────────────────
        let (w, h) = (self.w, self.h);
        let status_y = h.saturating_sub(STATUS_H);
        self.fill_rect(0, status_y, w, STATUS_H, TEXT_BG);
        let line = format!(
            "expansion {:.2}  rotation {:.2}  hover {}  held {}  frames {}  errors {}{}",
            payload.animation.expansion,
            payload.animation.rotation,
            payload.selection.hovered.as_deref().unwrap_or("-"),
            status.held.as_deref().unwrap_or("-"),
            stats.frames,
            stats.inference_errors,
            if payload.hands.left.is_open { "  open" } else { "" },
        );
        self.draw_label(&line, 10, status_y + 6, 0xFFEEEEEE);
        self.draw_label(
            "mouse=point  lmb=pinch  o=open left  l/r=toggle hand  q=quit",
            10, status_y + 18, 0xFF888888,
        );
    }

    fn world_to_px(&self, camera: &Camera, world: f32, depth: f32) -> isize {
        let ndc = world / camera.world_per_ndc(depth);
        (ndc * 0.5 * self.h as f32).round() as isize
    }

    fn draw_card(&mut self, card: &SelectableObject, camera: &Camera) {
        let Some(proj) = camera.project(card.pose.position) else { return };
        let (cx, cy) = self.ndc_to_pixel(proj.ndc);
        let half = self.world_to_px(camera, card.pose.size * 0.5, proj.depth).max(2);
        let radius = card.pose.corner_radius;
        let border = if card.is_hovered { HOVER_BORDER } else { CARD_BORDER };
        let edge = 1.0 / half as f32;

        for dy in -half..=half {
            for dx in -half..=half {
                let uv = Vec2::new(dx as f32, dy as f32) / (2 * half) as f32;
                if !tree_field::mask_contains(uv, radius) { continue; }
                let inner = tree_field::mask_contains(uv * (1.0 + 2.0 * edge), radius);
                let color = if !inner {
                    border
                } else if card.resource == ResourceStatus::Missing {
                    if ((dx + half) / 4 + (dy + half) / 4) % 2 == 0 { PLACEHOLDER_A } else { PLACEHOLDER_B }
                } else {
                    CARD_FILL
                };
                self.set_pixel_i(cx + dx, cy + dy, color);
            }
        }
    }

    fn draw_preview(&mut self, held: &str, payload: &RenderPayload) {
        let (w, h) = (self.w, self.h);
        for px in self.buf.iter_mut() {
            *px = blend(*px, 0xFF000000, 0.8);
        }
        let side = h.saturating_sub(STATUS_H + 80);
        let x0 = (w.saturating_sub(side)) / 2;
        let y0 = 30;
        let missing = payload
            .ornaments
            .iter()
            .any(|o| o.id == held && o.resource == ResourceStatus::Missing);
        let fill = if missing { PLACEHOLDER_A } else { CARD_FILL };
        self.fill_rect(x0, y0, side, side, fill);
        self.draw_border(x0, y0, side, side, HOVER_BORDER);
        self.draw_label(held, x0, y0 + side + 8, 0xFFFFD700);
        if missing {
            self.draw_label("missing", x0 + 6, y0 + 6, 0xFFEEEEEE);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(self.h) {
            for col in x..(x+w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(self.w) {
            if y < self.h           { self.buf[y       * self.w + col] = color; }
            if y+h-1 < self.h       { self.buf[(y+h-1) * self.w + col] = color; }
        }
        for row in y..(y+h).min(self.h) {
            if x < self.w           { self.buf[row * self.w + x    ] = color; }
            if x+w-1 < self.w       { self.buf[row * self.w + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.w && y < self.h {
            self.buf[y * self.w + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    fn fill_disc(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel_i(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham; both endpoints are drawn.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = ((x1 - x0).signum(), (y1 - y0).signum());
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel_i(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Minimal bitmap font, 3×5 characters, 5 rows × 3 bits each.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > self.w { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: the window around a Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    canvas:       Canvas,
    sim_tx:       Sender<SimInput>,
    last_pointer: Option<Vec2>,
    pinch_down:   bool,
    open_down:    bool,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, EngineError> {
        let mut window = Window::new(
            "Magic Tree: gesture preview",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| EngineError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas:       Canvas::new(WIN_W, WIN_H),
            sim_tx,
            last_pointer: None,
            pinch_down:   false,
            open_down:    false,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll mouse and keyboard and forward changes as [`SimInput`].
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }

        if self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }
        if self.window.is_key_pressed(Key::L, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::ToggleHand(Handedness::Left));
        }
        if self.window.is_key_pressed(Key::R, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::ToggleHand(Handedness::Right));
        }

        let open = self.window.is_key_down(Key::O);
        if open != self.open_down {
            self.open_down = open;
            let _ = self.sim_tx.send(SimInput::LeftOpen(open));
        }

        let pinch = self.window.get_mouse_down(MouseButton::Left);
        if pinch != self.pinch_down {
            self.pinch_down = pinch;
            let _ = self.sim_tx.send(SimInput::Pinch(pinch));
        }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let ndc = Vec2::new(
                mx / WIN_W as f32 * 2.0 - 1.0,
                1.0 - my / WIN_H as f32 * 2.0,
            );
            if self.last_pointer != Some(ndc) {
                self.last_pointer = Some(ndc);
                let _ = self.sim_tx.send(SimInput::Pointer(ndc));
            }
        }

        true
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        payload: &RenderPayload,
        camera:  &Camera,
        status:  &EngineStatus,
        stats:   &FrameStats,
    ) -> Result<(), EngineError> {
        self.canvas.draw_frame(payload, camera, status, stats);
        self.window
            .update_with_buffer(&self.canvas.buf, WIN_W, WIN_H)
            .map_err(|e| EngineError::Window(e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// `[0, 1]` RGB → opaque ARGB.
fn rgb_to_argb(c: Vec3) -> u32 {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF000000 | (q(c.x) << 16) | (q(c.y) << 8) | q(c.z)
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{Engine, FrameInput};
    use crate::source::SimHands;

    #[test]
    fn ndc_corners_map_to_canvas_corners() {
        let c = Canvas::new(100, 50);
        assert_eq!(c.ndc_to_pixel(Vec2::new(-1.0, 1.0)), (0, 0));
        assert_eq!(c.ndc_to_pixel(Vec2::ZERO), (50, 25));
        assert_eq!(c.ndc_to_pixel(Vec2::new(1.0, -1.0)), (100, 50));
    }

    #[test]
    fn color_helpers() {
        assert_eq!(rgb_to_argb(Vec3::new(1.0, 0.0, 0.0)), 0xFFFF0000);
        assert_eq!(rgb_to_argb(Vec3::splat(2.0)), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn frame_draws_cursor_and_status_bar() {
        let cfg = EngineConfig { seed: Some(3), ..EngineConfig::default() };
        let mut engine = Engine::new(&cfg).unwrap();
        let hands = SimHands { pointer: Vec2::new(0.5, 0.5), ..SimHands::default() };
        let payload = engine.step(FrameInput::Fresh(hands.detections()), 1.0 / 60.0);

        let mut canvas = Canvas::new(WIN_W, WIN_H);
        canvas.draw_frame(&payload, engine.camera(), &engine.status(), &engine.stats());

        assert!(payload.hands.right.detected);
        let (x, y) = canvas.ndc_to_pixel(payload.hands.right.position);
        assert_eq!(canvas.pixel(x as usize + 8, y as usize), Some(CURSOR_COLOR));
        assert_eq!(canvas.pixel(WIN_W - 1, WIN_H - 1), Some(TEXT_BG));
    }

    #[test]
    fn line_reaches_both_ends() {
        let mut c = Canvas::new(20, 20);
        c.draw_line((2, 3), (15, 9), STAR_COLOR);
        c.draw_line((4, 18), (4, 1), STAR_COLOR);
        for (x, y) in [(2, 3), (15, 9), (4, 18), (4, 1), (4, 10)] {
            assert_eq!(c.pixel(x, y), Some(STAR_COLOR), "({}, {})", x, y);
        }
        assert_eq!(c.pixel(19, 0), Some(BG_COLOR));
    }

    #[test]
    fn star_outline_turns_with_its_yaw() {
        let cfg = EngineConfig { seed: Some(3), ..EngineConfig::default() };
        let mut engine = Engine::new(&cfg).unwrap();
        let mut payload = engine.step(FrameInput::Stale, 1.0 / 60.0);
        payload.ornaments.clear();

        let mut tips = Vec::new();
        for yaw in [0.0, 1.2] {
            payload.star.yaw = yaw;
            let mut canvas = Canvas::new(WIN_W, WIN_H);
            canvas.draw_frame(&payload, engine.camera(), &engine.status(), &engine.stats());

            // An off-axis star point; the top one does not move under yaw.
            let outer = Star::outline()[2].extend(0.0);
            let proj = engine.camera().project(payload.star.position + payload.star.rotation() * outer).unwrap();
            let (x, y) = canvas.ndc_to_pixel(proj.ndc);
            assert_eq!(canvas.pixel(x as usize, y as usize), Some(STAR_COLOR));
            tips.push(x);
        }
        assert_ne!(tips[0], tips[1]);
    }

    #[test]
    fn holding_covers_window_with_preview() {
        let cfg = EngineConfig { seed: Some(3), ..EngineConfig::default() };
        let mut engine = Engine::new(&cfg).unwrap();
        let mut payload = engine.step(FrameInput::Stale, 1.0 / 60.0);
        payload.selection.held = Some("/images/1.jpg".into());

        let mut canvas = Canvas::new(WIN_W, WIN_H);
        canvas.draw_frame(&payload, engine.camera(), &engine.status(), &engine.stats());
        let side = WIN_H - (STATUS_H + 80);
        let x0 = (WIN_W - side) / 2;
        assert_eq!(canvas.pixel(x0 + side / 2, 30 + side / 2), Some(CARD_FILL));
    }
}
