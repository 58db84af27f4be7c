//! # paint_hands
//!
//! Hand-tracked spatial painting host for the `paint_gesture` engine, with a
//! software visualizer, a paintable demo scene and stdin voice commands.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Thumb + index pinch | Right | Draw a stroke at the pinch point |
//! | Thumb + middle pinch, aimed at an object | Right | Paint the object and its children |
//! | Open palm, held | Right | Erase stroke points around the palm (`openness-hold`) |
//! | Thumb + pinky pinch | Left | Erase (`dual-pinch` policy) |
//! | Thumb / index / middle pinch | Left | Mix red / green / blue into the brush color |
//!
//! Voice transcripts (one per line on stdin) map to "reset scene" and
//! "toggle mode" through the configured phrase lists.
//!
//! ## Feature flags
//!
//! * (default) - **Simulation mode**: mouse and keyboard drive two synthetic hands.
//! * `leap` - **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Gesture |
//! |---|---|
//! | Mouse | Move the right hand |
//! | `Space` / hold | Draw pinch |
//! | `P` / hold | Surface-paint pinch |
//! | `E` / hold | Open palm |
//! | `1` `2` `3` / hold | Left thumb / index / middle palette pinch |
//! | `X` / hold | Left thumb + pinky pinch |
//! | `L` / hold | Hide the left hand |
//! | `N` | Reset scene |
//! | `M` | Toggle passthrough |
//! | `Q` | Quit |

pub mod source;
pub mod scene;
pub mod hud;
pub mod passthrough;
pub mod voice;
pub mod visualizer;
pub mod app;
