use crate::catalog::{AspectRatio, PoseId};

use super::state::{ResultImage, SessionState, Step};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Leave the landing screen.
    Begin,
    /// Linear forward navigation, gated on the current step's validity.
    Advance,
    /// Step-indicator click; only the current step or an already-visited one.
    NavigateTo(Step),
    AddOrReplaceImage {
        slot: usize,
        bytes: Vec<u8>,
        mime_type: String,
    },
    RemoveImage {
        slot: usize,
    },
    ToggleReferenceFace {
        id: String,
    },
    SelectPose(PoseId),
    SetScene(String),
    SetAspectRatio(AspectRatio),
    SetPreserveOutfits(bool),
    SetSharedBackground(bool),
    GenerationStarted,
    GenerationSucceeded(ResultImage),
    GenerationFailed(String),
    /// Generation attempt ended without a result and without an error to
    /// display (credential re-prompt path).
    GenerationDeferred,
    StartOver,
}

/// Pure state transition. Rejected actions return the input state unchanged;
/// nothing here performs I/O.
pub fn reduce(state: &SessionState, action: SessionAction) -> SessionState {
    let mut next = state.clone();
    match action {
        SessionAction::Begin => {
            if next.step == Step::Landing {
                enter(&mut next, Step::Upload);
            }
        }
        SessionAction::Advance => match next.step {
            Step::Upload if next.images.count_valid() => enter(&mut next, Step::Pose),
            Step::Pose if next.selected_pose.is_some() => enter(&mut next, Step::Style),
            Step::Style => enter(&mut next, Step::Generate),
            _ => {}
        },
        SessionAction::NavigateTo(step) => {
            // Landing is reachable only via StartOver, Result only via a
            // successful generation.
            if matches!(step, Step::Landing | Step::Result) {
                return next;
            }
            if step == next.step || next.completed.contains(step) {
                enter(&mut next, step);
            }
        }
        SessionAction::AddOrReplaceImage {
            slot,
            bytes,
            mime_type,
        } => {
            next.images.add_or_replace(slot, bytes, &mime_type);
        }
        SessionAction::RemoveImage { slot } => {
            next.images.remove(slot);
        }
        SessionAction::ToggleReferenceFace { id } => {
            next.images.toggle_reference_face(&id);
        }
        SessionAction::SelectPose(pose) => {
            next.selected_pose = Some(pose);
        }
        SessionAction::SetScene(scene) => {
            next.style.scene = scene;
        }
        SessionAction::SetAspectRatio(ratio) => {
            next.style.aspect_ratio = ratio;
        }
        SessionAction::SetPreserveOutfits(value) => {
            next.style.preserve_outfits = value;
        }
        SessionAction::SetSharedBackground(value) => {
            next.style.shared_background = value;
        }
        SessionAction::GenerationStarted => {
            // Single-flight: a second start while one is pending is ignored.
            if !next.is_generating {
                next.is_generating = true;
                next.last_error = None;
            }
        }
        SessionAction::GenerationSucceeded(image) => {
            next.result_image = Some(image);
            next.is_generating = false;
            next.last_error = None;
            enter(&mut next, Step::Result);
        }
        SessionAction::GenerationFailed(message) => {
            next.is_generating = false;
            next.last_error = Some(message);
        }
        SessionAction::GenerationDeferred => {
            next.is_generating = false;
        }
        SessionAction::StartOver => {
            next = SessionState::new();
        }
    }
    next
}

fn enter(state: &mut SessionState, step: Step) {
    state.step = step;
    state.completed.insert(step);
}
