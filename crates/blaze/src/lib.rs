//! # Blaze: 2D Game Runtime Core
//!
//! The parts of a 2D game that don't depend on a window or a GPU: a small
//! ECS, scenes with a load/start/update/render/stop lifecycle, a variable or
//! fixed-timestep loop, and AABB collision with layer/mask filtering.
//!
//! Drawing goes through the [`Renderer`](render::Renderer) trait and input
//! arrives through [`SharedInput`](input::SharedInput), so the host decides
//! what is on the other side of both.
//!
//! Start with `use blaze::prelude::*` and build a [`Game`](game::Game).

pub mod asset;
pub mod collision;
pub mod config;
pub mod diag;
pub mod ecs;
pub mod error;
pub mod game;
pub mod game_loop;
pub mod input;
pub mod math;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod scene_manager;
pub mod sprite;
pub mod time;
