//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┬──────────────┐
//! │                                                     │  HUD         │
//! │   scene spheres (hidden in passthrough)             │  [tool]      │
//! │   strokes                                           │  [swatch]    │
//! │   hands, pinch point, erase ring, paint ray         │              │
//! │                                                     │  PALETTE     │
//! │                                                     │  STATE       │
//! │  status bar                                         │              │
//! └─────────────────────────────────────────────────────┴──────────────┘
//! ```
//!
//! World units are meters.  A weak perspective (`1 / (1 + z·k)`) keeps
//! depth readable: the paint ray shrinks toward the center as it goes in.

use std::collections::HashSet;
use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use paint_gesture::pose::Point3;
use paint_gesture::{GestureState, HandFrame, HandPoseSample, HudEvent, StrokeStore, TickReport};

use crate::passthrough::ViewMode;
use crate::scene::SphereScene;
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1100;
pub const WIN_H:       usize = 620;
const PANEL_W:         usize = 220;
const CANVAS_W:        usize = WIN_W - PANEL_W;
const STATUS_Y:        usize = WIN_H - 36;
const CENTER_X:        f32   = CANVAS_W as f32 / 2.0;
const CENTER_Y:        f32   = STATUS_Y as f32 / 2.0;
/// Pixels per meter at z = 0.
const SCALE:           f32   = 420.0;
const DEPTH_K:         f32   = 0.6;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const PASSTHROUGH_BG:  u32   = 0xFF3A3A3A;
const PANEL_BG:        u32   = 0xFF16213E;
const TEXT_BG:         u32   = 0xFF0F3460;
const HAND_COLOR:      u32   = 0xFFAADDFF;
const TIP_COLOR:       u32   = 0xFFFFD700;
const ERASE_COLOR:     u32   = 0xFFFF5555;
const RAY_COLOR:       u32   = 0xFF66FFCC;

/// Keys held for as long as they are down.
const HELD_KEYS: [(Key, SimKey); 8] = [
    (Key::Space, SimKey::Draw),
    (Key::E,     SimKey::OpenPalm),
    (Key::P,     SimKey::SurfacePaint),
    (Key::Key1,  SimKey::PaletteThumb),
    (Key::Key2,  SimKey::PaletteIndex),
    (Key::Key3,  SimKey::PaletteMiddle),
    (Key::X,     SimKey::DualPinch),
    (Key::L,     SimKey::HideLeft),
];

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

fn depth_scale(z: f32) -> f32 {
    SCALE / (1.0 + z.max(0.0) * DEPTH_K)
}

/// World point → canvas pixel (may be off-canvas).
pub fn project(p: Point3) -> (f32, f32) {
    let s = depth_scale(p[2]);
    (CENTER_X + p[0] * s, CENTER_Y - p[1] * s)
}

/// Canvas pixel → world X/Y on the plane at depth `z`.
pub fn unproject(px: f32, py: f32, z: f32) -> (f32, f32) {
    let s = depth_scale(z);
    ((px - CENTER_X) / s, (CENTER_Y - py) / s)
}

// ════════════════════════════════════════════════════════════════════════════
// FrameView - everything one frame draws
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameView<'a> {
    pub strokes:      &'a StrokeStore,
    pub scene:        &'a SphereScene,
    pub hands:        Option<&'a HandFrame>,
    pub report:       &'a TickReport,
    pub hud:          Option<&'a HudEvent>,
    pub hud_fade:     f32,
    pub mode:         ViewMode,
    pub erase_radius: f32,
    /// `(progress, settle_frames)` until the fingertips lock.
    pub calibration:  Option<(u32, u32)>,
    pub status:       &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    sim_tx:     Sender<SimInput>,
    held:       HashSet<SimKey>,
    hand_depth: f32,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, hand_depth: f32) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Paint Hands - spatial painting",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            held: HashSet::new(),
            hand_depth,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse and translate to SimInput events.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);

        if one_shot(&self.window, Key::Q) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Quit));
            return false;
        }
        if one_shot(&self.window, Key::N) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Reset));
        }
        if one_shot(&self.window, Key::M) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ToggleMode));
        }

        // Held keys: report edges only
        for (key, sim) in HELD_KEYS {
            let down = self.window.is_key_down(key);
            let was = self.held.contains(&sim);
            if down && !was {
                self.held.insert(sim);
                let _ = self.sim_tx.send(SimInput::KeyDown(sim));
            } else if !down && was {
                self.held.remove(&sim);
                let _ = self.sim_tx.send(SimInput::KeyUp(sim));
            }
        }

        // Mouse → right hand position
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            if (mx as usize) < CANVAS_W {
                let (x, y) = unproject(mx, my, self.hand_depth);
                let _ = self.sim_tx.send(SimInput::Pointer { x, y });
            }
        }

        true
    }

    /// Render one frame.
    pub fn render(&mut self, view: &FrameView<'_>) {
        // Clear
        let bg = if view.mode.shows_scene() { BG_COLOR } else { PASSTHROUGH_BG };
        self.buf.fill(bg);

        // ── Scene ─────────────────────────────────────────────────────────
        if view.mode.shows_scene() && view.scene.is_visible() {
            self.draw_scene(view.scene);
        }

        // ── Strokes ───────────────────────────────────────────────────────
        for stroke in view.strokes.query() {
            let color = stroke.color.to_argb();
            let pts: Vec<(f32, f32)> = stroke.positions().map(project).collect();
            for w in pts.windows(2) {
                self.draw_line(w[0], w[1], color, 2);
            }
        }
        // The active stroke may still be a lone point
        if let Some(s) = view.strokes.active().and_then(|id| view.strokes.get(id)) {
            if let Some(p) = s.last_position() {
                let (x, y) = project(p);
                self.fill_circle(x, y, 2.0, s.color.to_argb());
            }
        }

        // ── Hands ─────────────────────────────────────────────────────────
        if let Some(frame) = view.hands {
            for hand in frame.left.iter().chain(frame.right.iter()) {
                self.draw_hand(hand);
            }
        }

        // ── Tool overlays ─────────────────────────────────────────────────
        let r = view.report;
        if let Some(ray) = r.paint_ray {
            let color = if r.state == GestureState::PaintingSurface { TIP_COLOR } else { RAY_COLOR };
            self.draw_line(project(ray.origin), project(ray.end()), color, 1);
        }
        if let Some(p) = r.pinch_point {
            let (x, y) = project(p);
            let c = r.preview.map(|c| c.to_argb()).unwrap_or(0xFFFFFFFF);
            let radius = if r.state == GestureState::Drawing { 5.0 } else { 3.0 };
            self.fill_circle(x, y, radius, c);
        }
        if let Some(c) = r.erase_center {
            let (x, y) = project(c);
            self.draw_ring(x, y, view.erase_radius * depth_scale(c[2]), ERASE_COLOR);
        }

        // ── Side panel ────────────────────────────────────────────────────
        self.draw_panel(view, bg);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, CANVAS_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(view.status, 10, STATUS_Y + 10, 0xFFEEEEEE, 1);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "mouse=move  space=draw  p=paint  e=erase  x=dual pinch  1/2/3=palette  l=hide left  m=mode  n=reset  q=quit",
            10, WIN_H - 16, 0xFF888888, 1,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Scene ─────────────────────────────────────────────────────────────

    fn draw_scene(&mut self, scene: &SphereScene) {
        // Far to near
        let mut order: Vec<usize> = (0..scene.spheres().len()).collect();
        order.sort_by(|a, b| scene.spheres()[*b].center[2].total_cmp(&scene.spheres()[*a].center[2]));
        for i in order {
            let s = &scene.spheres()[i];
            let (x, y) = project(s.center);
            let r = s.radius * depth_scale(s.center[2]);
            let base = s.color.to_argb();
            self.fill_circle(x, y, r, base);
            // Cheap highlight toward the upper left
            self.fill_circle(x - r * 0.3, y - r * 0.3, r * 0.35, blend(base, 0xFFFFFFFF, 0.25));
        }
    }

    // ── Hands ─────────────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandPoseSample) {
        for j in &hand.joints {
            let (x, y) = project(j.position);
            let tip = j.looks_like("tip");
            self.fill_circle(x, y, if tip { 3.0 } else { 2.0 }, if tip { TIP_COLOR } else { HAND_COLOR });
        }
    }

    // ── Panel ─────────────────────────────────────────────────────────────

    fn draw_panel(&mut self, view: &FrameView<'_>, bg: u32) {
        let x0 = CANVAS_W;
        self.fill_rect(x0, 0, PANEL_W, WIN_H, PANEL_BG);

        self.draw_label("HUD", x0 + 10, 10, 0xFFFFD700, 1);
        if let Some(event) = view.hud {
            let t = view.hud_fade;
            self.draw_label(&event.tool, x0 + 10, 24, blend(PANEL_BG, 0xFFFFFFFF, t), 3);
            if let Some(c) = event.color {
                self.fill_rect(x0 + 120, 22, 60, 20, blend(PANEL_BG, c.to_argb(), t));
            }
        }

        self.draw_label("PALETTE", x0 + 10, 70, 0xFFFFD700, 1);
        match view.report.preview {
            Some(c) => self.fill_rect(x0 + 10, 84, 80, 24, c.to_argb()),
            None => self.draw_label("none", x0 + 10, 92, 0xFF888888, 1),
        }

        self.draw_label("STATE", x0 + 10, 124, 0xFFFFD700, 1);
        self.draw_label(state_label(view.report.state), x0 + 10, 138, 0xFFEEEEEE, 2);

        self.draw_label("VIEW", x0 + 10, 170, 0xFFFFD700, 1);
        let mode = view.mode.to_string();
        self.draw_label(&mode, x0 + 10, 184, blend(bg, 0xFFFFFFFF, 0.8), 1);

        self.draw_label("FINGERTIPS", x0 + 10, 206, 0xFFFFD700, 1);
        match view.calibration {
            None => self.draw_label("locked", x0 + 10, 220, 0xFF66FF66, 1),
            Some((p, n)) => {
                self.draw_label("pinch to calibrate", x0 + 10, 220, 0xFFEEEEEE, 1);
                let w = ((PANEL_W - 20) as f32 * p as f32 / n.max(1) as f32) as usize;
                self.fill_rect(x0 + 10, 232, PANEL_W - 20, 6, TEXT_BG);
                self.fill_rect(x0 + 10, 232, w, 6, 0xFF66FF66);
            }
        }

        self.draw_label("STROKES", x0 + 10, 254, 0xFFFFD700, 1);
        let counts = format!(
            "{} live  {} points",
            view.strokes.query().count(),
            view.strokes.total_points()
        );
        self.draw_label(&counts, x0 + 10, 268, 0xFFEEEEEE, 1);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    /// Plot inside the canvas only (the panel is drawn separately).
    fn plot(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < CANVAS_W && (y as usize) < STATUS_Y {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let r = r.max(0.5);
        let (x0, x1) = ((cx - r).floor() as isize, (cx + r).ceil() as isize);
        let (y0, y1) = ((cy - r).floor() as isize, (cy + r).ceil() as isize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.plot(x, y, color);
                }
            }
        }
    }

    fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let steps = ((r * 6.0) as usize).clamp(16, 720);
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            self.plot((cx + r * a.cos()) as isize, (cy + r * a.sin()) as isize, color);
        }
    }

    fn draw_line(&mut self, a: (f32, f32), b: (f32, f32), color: u32, width: isize) {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let steps = dx.abs().max(dy.abs()).ceil().clamp(1.0, 4000.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.0 + dx * t) as isize;
            let y = (a.1 + dy * t) as isize;
            for ox in 0..width {
                for oy in 0..width {
                    self.plot(x + ox, y + oy, color);
                }
            }
        }
    }

    /// Minimal bitmap font - 3×5 characters, scaled by an integer factor.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.set_pixel(cx + col * scale + sx, y + row * scale + sy, color);
                            }
                        }
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

fn state_label(state: GestureState) -> &'static str {
    match state {
        GestureState::Idle => "idle",
        GestureState::Drawing => "draw",
        GestureState::Erasing => "erase",
        GestureState::PaintingSurface => "paint",
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
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
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
