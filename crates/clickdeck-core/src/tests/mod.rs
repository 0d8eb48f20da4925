//! Test module for clickdeck-core
//!
//! This module contains cross-component tests for:
//! - Popup lifecycle, gestures, launch timing and menus
//! - Undo/redo round trips over recorded drags
//! - Item and layout persistence through the JSON stores

// Test modules use exact float comparisons and test-specific casts
#![allow(clippy::float_cmp, clippy::cast_precision_loss)]

mod fixtures;
