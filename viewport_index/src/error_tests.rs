//! Unit tests for error.rs
//!
//! Tests Error variants and their Display / Debug / Clone / std::error::Error implementations.

use crate::error::{Error, Result};
use crate::scene::ObjectId;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_duplicate_sample_display() {
    let err = Error::DuplicateSample {
        owner: ObjectId::from("cube-a"),
        local_index: -1,
    };
    let display = format!("{}", err);
    assert!(display.contains("Duplicate sample"));
    assert!(display.contains("cube-a"));
    assert!(display.contains("-1"));
}

#[test]
fn test_scene_not_indexed_display() {
    let display = format!("{}", Error::SceneNotIndexed);
    assert!(display.contains("index_scene"));
}

#[test]
fn test_invalid_viewport_display() {
    let err = Error::InvalidViewport("0x600".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid viewport"));
    assert!(display.contains("0x600"));
}

#[test]
fn test_pipeline_disposed_display() {
    assert_eq!(format!("{}", Error::PipelineDisposed), "Pipeline disposed");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::ViewNotIndexed;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::CollaboratorUnavailable("camera".to_string()));
    assert!(debug.contains("CollaboratorUnavailable"));

    let debug = format!("{:?}", Error::DuplicateObject(ObjectId::from("x")));
    assert!(debug.contains("DuplicateObject"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidConfig("octree depth".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::SceneNotIndexed);
}

// ============================================================================
// RESULT TYPE
// ============================================================================

#[test]
fn test_result_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::ViewNotIndexed)
    }
    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }
    assert_eq!(outer(), Err(Error::ViewNotIndexed));
}

#[test]
fn test_index_err_macro_returns_error() {
    let err = crate::index_err!("viewport_index::Test", Error::SceneNotIndexed);
    assert_eq!(err, Error::SceneNotIndexed);
}
