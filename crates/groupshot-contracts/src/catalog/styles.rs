pub const SCENES: &[&str] = &[
    "Studio neutral (soft grey)",
    "Outdoor sunny park",
    "Modern office lobby",
    "Luxury event backdrop",
    "Cozy living room",
    "Urban city street",
];

pub const DEFAULT_SCENE: &str = "Studio neutral (soft grey)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square1x1,
    Portrait3x4,
    Landscape4x3,
    Tall9x16,
    Wide16x9,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square1x1 => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Tall9x16 => "9:16",
            AspectRatio::Wide16x9 => "16:9",
        }
    }

    pub fn parse(value: &str) -> Option<AspectRatio> {
        ALL_ASPECT_RATIOS
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == value.trim())
    }

    /// Pixel dimensions used when an output has to be rendered locally.
    pub fn render_dims(self) -> (u32, u32) {
        match self {
            AspectRatio::Square1x1 => (1024, 1024),
            AspectRatio::Portrait3x4 => (768, 1024),
            AspectRatio::Landscape4x3 => (1024, 768),
            AspectRatio::Tall9x16 => (576, 1024),
            AspectRatio::Wide16x9 => (1024, 576),
        }
    }
}

pub const ALL_ASPECT_RATIOS: [AspectRatio; 5] = [
    AspectRatio::Square1x1,
    AspectRatio::Portrait3x4,
    AspectRatio::Landscape4x3,
    AspectRatio::Tall9x16,
    AspectRatio::Wide16x9,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSelection {
    pub scene: String,
    pub aspect_ratio: AspectRatio,
    pub preserve_outfits: bool,
    pub shared_background: bool,
}

impl Default for StyleSelection {
    fn default() -> Self {
        Self {
            scene: DEFAULT_SCENE.to_string(),
            aspect_ratio: AspectRatio::Square1x1,
            preserve_outfits: true,
            shared_background: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AspectRatio, StyleSelection, ALL_ASPECT_RATIOS, DEFAULT_SCENE, SCENES};

    #[test]
    fn default_scene_is_part_of_the_catalog() {
        assert!(SCENES.contains(&DEFAULT_SCENE));
    }

    #[test]
    fn aspect_ratios_round_trip_through_parse() {
        for ratio in ALL_ASPECT_RATIOS {
            assert_eq!(AspectRatio::parse(ratio.as_str()), Some(ratio));
        }
        assert_eq!(AspectRatio::parse(" 16:9 "), Some(AspectRatio::Wide16x9));
        assert_eq!(AspectRatio::parse("2:1"), None);
    }

    #[test]
    fn render_dims_match_orientation() {
        let (w, h) = AspectRatio::Tall9x16.render_dims();
        assert!(h > w);
        let (w, h) = AspectRatio::Wide16x9.render_dims();
        assert!(w > h);
        let (w, h) = AspectRatio::Square1x1.render_dims();
        assert_eq!(w, h);
    }

    #[test]
    fn style_defaults_match_landing_state() {
        let style = StyleSelection::default();
        assert_eq!(style.scene, DEFAULT_SCENE);
        assert_eq!(style.aspect_ratio, AspectRatio::Square1x1);
        assert!(style.preserve_outfits);
        assert!(style.shared_background);
    }
}
