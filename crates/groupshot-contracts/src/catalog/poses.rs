use indexmap::IndexMap;

/// Group size at which row-split poses switch from a single cluster to a
/// front-row/back-row arrangement.
const ROW_SPLIT_MIN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseId {
    Lineup,
    ArmsAround,
    Wedding,
    Sports,
    Graduation,
    Conference,
    Party,
    Family,
}

impl PoseId {
    pub fn as_str(self) -> &'static str {
        match self {
            PoseId::Lineup => "lineup",
            PoseId::ArmsAround => "arms-around",
            PoseId::Wedding => "wedding",
            PoseId::Sports => "sports",
            PoseId::Graduation => "graduation",
            PoseId::Conference => "conference",
            PoseId::Party => "party",
            PoseId::Family => "family",
        }
    }

    pub fn parse(value: &str) -> Option<PoseId> {
        let normalized = value.trim().to_ascii_lowercase();
        ALL_POSES
            .iter()
            .copied()
            .find(|pose| pose.as_str() == normalized)
    }
}

pub const ALL_POSES: [PoseId; 8] = [
    PoseId::Lineup,
    PoseId::ArmsAround,
    PoseId::Wedding,
    PoseId::Sports,
    PoseId::Graduation,
    PoseId::Conference,
    PoseId::Party,
    PoseId::Family,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseSpec {
    pub id: PoseId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub hint: &'static str,
    pub emblem: &'static str,
}

pub fn pose_catalog() -> IndexMap<PoseId, PoseSpec> {
    let mut map = IndexMap::new();

    let mut insert = |id: PoseId,
                      display_name: &'static str,
                      description: &'static str,
                      hint: &'static str,
                      emblem: &'static str| {
        map.insert(
            id,
            PoseSpec {
                id,
                display_name,
                description,
                hint,
                emblem,
            },
        );
    };

    insert(
        PoseId::Lineup,
        "Classic Lineup",
        "A traditional shoulder-to-shoulder arrangement.",
        "Best for 2-5 people. Simple and formal.",
        "👥",
    );
    insert(
        PoseId::ArmsAround,
        "Arms Around Shoulders",
        "A friendly, close-knit pose.",
        "Creates a warm, familiar feel.",
        "🫂",
    );
    insert(
        PoseId::Wedding,
        "Wedding-style Arrangement",
        "Formal staggered rows.",
        "Excellent for 4-5 people. Looks very professional.",
        "🏛️",
    );
    insert(
        PoseId::Sports,
        "Sports Team Pose",
        "Athletic-style group framing.",
        "Dynamic and powerful.",
        "⚽",
    );
    insert(
        PoseId::Graduation,
        "Graduation Pose",
        "A tight, celebratory cluster.",
        "Best for high energy and smiles.",
        "🎓",
    );
    insert(
        PoseId::Conference,
        "Conference Group",
        "Semi-formal business arrangement.",
        "Great for professional headshots.",
        "💼",
    );
    insert(
        PoseId::Party,
        "Party Pose",
        "Casual, slightly angled, fun.",
        "Vibrant and relaxed.",
        "🎉",
    );
    insert(
        PoseId::Family,
        "Family Portrait",
        "Centered and balanced.",
        "Classic for any group size.",
        "🏠",
    );

    map
}

pub fn pose_spec(id: PoseId) -> PoseSpec {
    pose_catalog()
        .get(&id)
        .cloned()
        .expect("catalog covers every pose id")
}

/// Spatial-arrangement directive for a pose at a given group size.
/// Deterministic: the same inputs always produce the same text.
pub fn pose_rules(pose: PoseId, person_count: usize) -> String {
    let n = person_count;
    match pose {
        PoseId::Lineup => format!(
            "Arrange all {n} people in a straight horizontal line, equal spacing, shoulders slightly overlapping or touching."
        ),
        PoseId::ArmsAround => {
            "People should lean inward towards the center. Have them put arms around each other's shoulders or waists. High proximity."
                .to_string()
        }
        PoseId::Wedding => {
            if n >= ROW_SPLIT_MIN {
                format!(
                    "Arrange in two rows: 2 people seated in front, {} standing directly behind.",
                    n - 2
                )
            } else {
                "Stagger the heights slightly; have one person slightly forward and centered, others flanking."
                    .to_string()
            }
        }
        PoseId::Sports => {
            if n >= ROW_SPLIT_MIN {
                format!(
                    "Two people kneeling in the front row, remaining {} standing in the back row.",
                    n - 2
                )
            } else {
                "All subjects in a tight cluster, one person kneeling or crouching slightly to vary height."
                    .to_string()
            }
        }
        PoseId::Graduation => format!(
            "A tight cluster of {n} people, slightly angled towards each other, joyful expressions, looking directly at the camera."
        ),
        PoseId::Conference => {
            "Staggered rows, professional posture, hands at sides or folded in front, clean spacing."
                .to_string()
        }
        PoseId::Party => {
            "Candid-style but looking at camera. Varied angles, relaxed shoulders, asymmetrical but balanced composition."
                .to_string()
        }
        PoseId::Family => {
            "Centered composition. Taller people in the middle-back, shorter or seated people in front or sides. Coherent and warm."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{pose_catalog, pose_rules, pose_spec, PoseId, ALL_POSES};

    #[test]
    fn catalog_preserves_declaration_order() {
        let catalog = pose_catalog();
        let ids: Vec<PoseId> = catalog.keys().copied().collect();
        assert_eq!(ids, ALL_POSES.to_vec());
    }

    #[test]
    fn every_pose_round_trips_through_parse() {
        for pose in ALL_POSES {
            assert_eq!(PoseId::parse(pose.as_str()), Some(pose));
        }
        assert_eq!(PoseId::parse("SPORTS"), Some(PoseId::Sports));
        assert_eq!(PoseId::parse("mosh-pit"), None);
    }

    #[test]
    fn rules_are_pure_for_every_pose_and_count() {
        for pose in ALL_POSES {
            for count in 2..=5 {
                assert_eq!(pose_rules(pose, count), pose_rules(pose, count));
            }
        }
    }

    #[test]
    fn count_sensitive_rules_embed_the_literal_count() {
        assert!(pose_rules(PoseId::Lineup, 3).contains("all 3 people"));
        assert!(pose_rules(PoseId::Graduation, 4).contains("cluster of 4 people"));
    }

    #[test]
    fn sports_switches_arrangement_at_four_people() {
        let five = pose_rules(PoseId::Sports, 5);
        assert!(five.contains("Two people kneeling in the front row"));
        assert!(five.contains("remaining 3 standing in the back row"));

        let three = pose_rules(PoseId::Sports, 3);
        assert!(three.contains("tight cluster"));
        assert!(!three.contains("back row"));
    }

    #[test]
    fn wedding_switches_arrangement_at_four_people() {
        let four = pose_rules(PoseId::Wedding, 4);
        assert!(four.contains("2 people seated in front"));
        assert!(four.contains("2 standing directly behind"));

        let two = pose_rules(PoseId::Wedding, 2);
        assert!(two.contains("Stagger the heights"));
        assert!(!two.contains("seated in front"));
    }

    #[test]
    fn specs_carry_display_copy() {
        let spec = pose_spec(PoseId::Lineup);
        assert_eq!(spec.display_name, "Classic Lineup");
        assert!(!spec.description.is_empty());
        assert!(!spec.hint.is_empty());
    }
}
