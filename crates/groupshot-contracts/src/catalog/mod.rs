mod poses;
mod styles;

pub use poses::{pose_catalog, pose_rules, pose_spec, PoseId, PoseSpec, ALL_POSES};
pub use styles::{AspectRatio, StyleSelection, ALL_ASPECT_RATIOS, DEFAULT_SCENE, SCENES};
