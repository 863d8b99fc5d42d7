use crate::catalog::{pose_rules, pose_spec, PoseId, StyleSelection};

/// Composes the director prompt for a group composition: exact person count,
/// pose arrangement rules, scene, the two toggle-driven clauses, and the
/// fixed anatomical/single-image constraints.
pub fn build_group_directive(person_count: usize, pose: PoseId, style: &StyleSelection) -> String {
    let spec = pose_spec(pose);
    let rules = pose_rules(pose, person_count);
    let integration = if style.shared_background {
        "- Integration: Ensure all subjects are perfectly integrated into a single coherent 3D environment with shared lighting and ground shadows."
    } else {
        "- Integration: Focus on individual character rendering within the specified scene."
    };
    let outfits = if style.preserve_outfits {
        "- Outfits: Strictly preserve the exact clothing and outfits from the reference photos for each individual."
    } else {
        "- Outfits: Maintain identity but you can adapt outfits to suit the scene and lighting for a more realistic result."
    };

    format!(
        "Create a photorealistic group photo containing EXACTLY {person_count} people, using the provided reference photos for each person's face and identity.\n\
         \n\
         Pose Style: {pose_name}.\n\
         Composition Strategy: {rules}.\n\
         \n\
         Environmental Context:\n\
         - Lighting: Soft natural light, realistic shadows across all subjects.\n\
         - Background: {scene}.\n\
         {integration}\n\
         {outfits}\n\
         \n\
         Strict Requirements:\n\
         - No extra limbs or merged faces.\n\
         - Realistic proportions and anatomical correctness.\n\
         - The output must be one single, seamless, high-fidelity photorealistic image.\n\
         \n\
         Return one final image only.",
        pose_name = spec.display_name,
        scene = style.scene,
    )
}

/// Wraps a free-text refinement instruction with the identity-preserving and
/// single-image-output constraints.
pub fn build_edit_directive(instruction: &str) -> String {
    format!(
        "Modify the provided image based on this instruction: \"{}\".\n\
         Maintain faces and identities. Photorealistic style only.\n\
         Return one final edited image only.",
        instruction.trim()
    )
}

#[cfg(test)]
mod tests {
    use crate::catalog::{AspectRatio, PoseId, StyleSelection};

    use super::{build_edit_directive, build_group_directive};

    fn style(preserve_outfits: bool, shared_background: bool) -> StyleSelection {
        StyleSelection {
            scene: "Outdoor sunny park".to_string(),
            aspect_ratio: AspectRatio::Square1x1,
            preserve_outfits,
            shared_background,
        }
    }

    #[test]
    fn directive_embeds_count_pose_and_scene() {
        let directive = build_group_directive(3, PoseId::Lineup, &style(true, true));
        assert!(directive.contains("EXACTLY 3 people"));
        assert!(directive.contains("Pose Style: Classic Lineup."));
        assert!(directive.contains("Arrange all 3 people in a straight horizontal line"));
        assert!(directive.contains("- Background: Outdoor sunny park."));
        assert!(directive.ends_with("Return one final image only."));
    }

    #[test]
    fn adapt_outfits_with_shared_background_picks_the_right_clauses() {
        let directive = build_group_directive(4, PoseId::Family, &style(false, true));
        assert!(directive.contains("you can adapt outfits"));
        assert!(directive.contains("single coherent 3D environment"));
        assert!(!directive.contains("Strictly preserve the exact clothing"));
        assert!(!directive.contains("individual character rendering"));
    }

    #[test]
    fn preserve_outfits_with_separate_backgrounds_picks_the_opposites() {
        let directive = build_group_directive(4, PoseId::Family, &style(true, false));
        assert!(directive.contains("Strictly preserve the exact clothing"));
        assert!(directive.contains("individual character rendering"));
        assert!(!directive.contains("you can adapt outfits"));
        assert!(!directive.contains("single coherent 3D environment"));
    }

    #[test]
    fn fixed_constraints_are_always_present() {
        for (outfits, background) in [(true, true), (true, false), (false, true), (false, false)] {
            let directive = build_group_directive(2, PoseId::Party, &style(outfits, background));
            assert!(directive.contains("No extra limbs or merged faces."));
            assert!(directive.contains("one single, seamless, high-fidelity photorealistic image"));
        }
    }

    #[test]
    fn directive_is_deterministic() {
        let a = build_group_directive(5, PoseId::Sports, &style(true, true));
        let b = build_group_directive(5, PoseId::Sports, &style(true, true));
        assert_eq!(a, b);
    }

    #[test]
    fn edit_directive_quotes_the_trimmed_instruction() {
        let directive = build_edit_directive("  make the sky dusk  ");
        assert!(directive.contains("instruction: \"make the sky dusk\""));
        assert!(directive.contains("Maintain faces and identities."));
        assert!(directive.ends_with("Return one final edited image only."));
    }
}
