//! Annotation engine for the Wheeler-diagram geology exam.
//!
//! This crate is compiled to WebAssembly and runs in the browser. Students
//! annotate a static cross-section diagram and build a Wheeler diagram on a
//! second canvas; placements on the cross-section are projected onto the
//! Wheeler plot in the same event turn. A wall-clock-anchored countdown
//! drives the exam lifecycle. The host JavaScript layer wires DOM events to
//! the engine, reacts to the returned [`engine::Action`]s and
//! [`timer::TimerEvent`]s, and owns auto-save and export downloads.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`board`] | Paired cross-section / Wheeler surfaces and projection routing |
//! | [`engine`] | Annotation surface: testable [`engine::SurfaceCore`] and canvas-bound [`engine::Surface`] |
//! | [`doc`] | Element variants and the ordered element list |
//! | [`history`] | Bounded undo/redo stacks |
//! | [`input`] | Tools and the per-tool interaction state machine |
//! | [`hit`] | Topmost-first hit-testing |
//! | [`project`] | Cross-canvas projection and system-tract generation |
//! | [`numbering`] | Shared termination number registry and strata counter |
//! | [`timer`] | Exam countdown with persisted deadline |
//! | [`clock`] | Wall-clock sources |
//! | [`store`] | Key-value persistence collaborator |
//! | [`render`] | 2D drawing of a surface's scene |
//! | [`web`] | Browser bindings (canvas lookup, `localStorage`) |
//! | [`export`] | Export payload assembly |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types and stable error codes |
//! | [`geom`] | Geometry and colour helpers |
//! | [`consts`] | Shared numeric constants |

pub mod board;
pub mod clock;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod export;
pub mod geom;
pub mod history;
pub mod hit;
pub mod input;
pub mod numbering;
pub mod project;
pub mod render;
pub mod store;
pub mod timer;
pub mod web;
