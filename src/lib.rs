//! Highway Simulation Library
//!
//! A lane-based highway driving engine: player kinematics, reactive
//! traffic, procedural spawning and a persisted boost resource. It runs
//! headless; a renderer only needs [`simulation::SimWorld::snapshot`].

pub mod simulation;
