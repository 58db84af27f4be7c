//! # paint_gesture
//!
//! Gesture classification and stroke geometry for hand-tracked spatial
//! painting.  The crate turns per-frame hand samples into painting actions:
//! freehand strokes, one-shot surface recolor, and radius erase, with a
//! three-channel palette picked by the opposite hand.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Index pinch (hysteresis) | Right | Draw a stroke at the thumb/index midpoint |
//! | Thumb + middle pinch, ray hits | Right | Recolor the hit object and its children |
//! | Open palm held (`openness-hold`) | Right | Erase around the palm center |
//! | Thumb + pinky pinch (`dual-pinch`) | Left | Erase around the right palm center |
//! | Thumb / index / middle pinch | Left | Palette: red / green / blue, mixed when combined |
//!
//! Priority per frame: erase > surface paint > draw > idle.
//!
//! ## Driving the engine
//!
//! ```rust,no_run
//! use paint_gesture::{HandFrame, Orchestrator, PaintConfig, NullHud};
//! use paint_gesture::surface::EmptyScene;
//!
//! let mut orch = Orchestrator::new(PaintConfig::default());
//! let mut scene = EmptyScene;
//! let mut hud = NullHud;
//!
//! // once per host frame
//! let frame = HandFrame::untracked();
//! let report = orch.tick(&frame, 1.0 / 90.0, &mut scene, &mut hud);
//! println!("{:?}", report.state);
//! ```
//!
//! The core is single-threaded and never blocks; the host owns the frame loop.

pub mod error;
pub mod pose;
pub mod config;
pub mod fingertip;
pub mod classifier;
pub mod palette;
pub mod stroke;
pub mod surface;
pub mod orchestrator;
pub mod voice;

pub use classifier::{ClassifierSettings, EraserPolicy, GestureClassifier, GestureState};
pub use config::PaintConfig;
pub use error::{ConfigError, StrokeError};
pub use fingertip::{FingertipBinding, FingertipResolver};
pub use orchestrator::{HudEvent, HudSink, NullHud, Orchestrator, TickReport};
pub use palette::{Color, PaletteMixer, PaletteState};
pub use pose::{Confidence, Finger, HandFrame, HandPoseSample, JointId, JointSample, Point3};
pub use stroke::{EraseReport, Stroke, StrokeId, StrokePoint, StrokeStore};
pub use surface::{LayerMask, ObjectHandle, PaintableScene, Ray, SceneQuery, SurfacePainter};
pub use voice::{VoiceCommand, VoicePhrases};
