//! # magic_tree
//!
//! Gesture-driven interactive tree scene.  Two hands steer a cloud of
//! several thousand particles: the left hand opens the formed tree into an
//! exploded shell, the right hand points at the photo ornaments and pinches
//! to grab one.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Open (fingers spread) | Left | Explode the tree and spin it slowly |
//! | Closed | Left | Reform the tree and return to rest |
//! | Point | Right | Move the cursor; hover the nearest card under it |
//! | Pinch (press) | Right | Grab the hovered card (or a random one when exploded) |
//! | Pinch (release) | Right | Let go |
//!
//! ## Modes
//!
//! * **Simulation** (the only landmark source shipped): mouse and keyboard
//!   synthesize the packed landmark buffer a real model would report.
//!   Other sources plug in through [`source::LandmarkSource`].
//!
//! ### Simulation controls
//!
//! | Input | Gesture |
//! |---|---|
//! | Mouse move | Right index fingertip |
//! | Left button / hold | Right pinch |
//! | `O` / hold | Left hand open |
//! | `L` / `R` | Toggle left / right hand presence |
//! | `Q` | Quit |

pub mod camera;
pub mod config;
pub mod error;
pub mod handoff;
pub mod interpolator;
pub mod selection;
pub mod source;
pub mod engine;
pub mod visualizer;
pub mod app;
