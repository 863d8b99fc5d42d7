use crate::catalog::{PoseId, StyleSelection};
use crate::intake::ImageIntake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Landing,
    Upload,
    Pose,
    Style,
    Generate,
    Result,
}

pub const ALL_STEPS: [Step; 6] = [
    Step::Landing,
    Step::Upload,
    Step::Pose,
    Step::Style,
    Step::Generate,
    Step::Result,
];

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Landing => "landing",
            Step::Upload => "upload",
            Step::Pose => "pose",
            Step::Style => "style",
            Step::Generate => "generate",
            Step::Result => "result",
        }
    }

    pub fn parse(value: &str) -> Option<Step> {
        let normalized = value.trim().to_ascii_lowercase();
        ALL_STEPS
            .iter()
            .copied()
            .find(|step| step.as_str() == normalized)
    }
}

/// Steps the user has ever reached. Grows monotonically until a full reset;
/// gates which steps the navigation indicator will accept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSet {
    steps: Vec<Step>,
}

impl StepSet {
    pub fn insert(&mut self, step: Step) {
        if !self.steps.contains(&step) {
            self.steps.push(step);
        }
    }

    pub fn contains(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Step> + '_ {
        self.steps.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub step: Step,
    pub images: ImageIntake,
    pub selected_pose: Option<PoseId>,
    pub style: StyleSelection,
    pub result_image: Option<ResultImage>,
    pub is_generating: bool,
    pub last_error: Option<String>,
    pub completed: StepSet,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            step: Step::Landing,
            images: ImageIntake::new(),
            selected_pose: None,
            style: StyleSelection::default(),
            result_image: None,
            is_generating: false,
            last_error: None,
            completed: StepSet::default(),
        }
    }

    /// Whether the linear forward transition out of the current step is
    /// currently permitted.
    pub fn can_advance(&self) -> bool {
        match self.step {
            Step::Upload => self.images.count_valid(),
            Step::Pose => self.selected_pose.is_some(),
            Step::Style => true,
            Step::Landing | Step::Generate | Step::Result => false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
