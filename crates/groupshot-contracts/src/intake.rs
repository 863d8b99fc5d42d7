use uuid::Uuid;

pub const MIN_PEOPLE: usize = 2;
pub const MAX_PEOPLE: usize = 5;

const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonImage {
    pub id: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub reference_face: bool,
}

/// Ordered portrait slots for one session. Slots are positional 0..4 and
/// compact on removal; payload order is what the composition call sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageIntake {
    images: Vec<PersonImage>,
}

impl ImageIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the image at `slot`, or append when `slot` is the next free
    /// position. Unsupported MIME types, out-of-range slots, and appends to a
    /// full store are silent no-ops returning `None`.
    pub fn add_or_replace(
        &mut self,
        slot: usize,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Option<&PersonImage> {
        if !is_accepted_mime(mime_type) {
            return None;
        }
        if slot > self.images.len() {
            return None;
        }
        if slot == self.images.len() && self.images.len() >= MAX_PEOPLE {
            return None;
        }

        let image = PersonImage {
            id: Uuid::new_v4().to_string(),
            bytes,
            mime_type: mime_type.to_string(),
            reference_face: false,
        };
        if slot < self.images.len() {
            self.images[slot] = image;
        } else {
            self.images.push(image);
        }
        self.images.get(slot)
    }

    pub fn remove(&mut self, slot: usize) {
        if slot < self.images.len() {
            self.images.remove(slot);
        }
    }

    /// Flip the reference-face flag on the image with `id`. Flags on other
    /// images are left as-is; more than one image may carry the flag.
    pub fn toggle_reference_face(&mut self, id: &str) -> bool {
        for image in &mut self.images {
            if image.id == id {
                image.reference_face = !image.reference_face;
                return true;
            }
        }
        false
    }

    pub fn images(&self) -> &[PersonImage] {
        self.images.as_slice()
    }

    pub fn get(&self, slot: usize) -> Option<&PersonImage> {
        self.images.get(slot)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn count_valid(&self) -> bool {
        (MIN_PEOPLE..=MAX_PEOPLE).contains(&self.images.len())
    }
}

fn is_accepted_mime(mime_type: &str) -> bool {
    let normalized = mime_type.trim().to_ascii_lowercase();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| *accepted == normalized)
}

#[cfg(test)]
mod tests {
    use super::{ImageIntake, MAX_PEOPLE};

    fn filled(count: usize) -> ImageIntake {
        let mut intake = ImageIntake::new();
        for idx in 0..count {
            intake
                .add_or_replace(idx, vec![idx as u8], "image/png")
                .expect("slot accepted");
        }
        intake
    }

    #[test]
    fn append_assigns_fresh_id_and_clears_flag() {
        let mut intake = ImageIntake::new();
        let image = intake
            .add_or_replace(0, vec![1, 2, 3], "image/jpeg")
            .expect("accepted");
        assert!(!image.id.is_empty());
        assert!(!image.reference_face);
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(intake.len(), 1);
    }

    #[test]
    fn rejects_unsupported_mime_silently() {
        let mut intake = ImageIntake::new();
        assert!(intake.add_or_replace(0, vec![1], "image/gif").is_none());
        assert!(intake.add_or_replace(0, vec![1], "text/plain").is_none());
        assert!(intake.is_empty());
    }

    #[test]
    fn accepts_mime_case_insensitively() {
        let mut intake = ImageIntake::new();
        assert!(intake.add_or_replace(0, vec![1], "IMAGE/PNG").is_some());
    }

    #[test]
    fn replace_keeps_position_and_mints_new_id() {
        let mut intake = filled(3);
        let old_id = intake.get(1).expect("slot").id.clone();
        let replaced = intake
            .add_or_replace(1, vec![9], "image/webp")
            .expect("accepted")
            .clone();
        assert_ne!(replaced.id, old_id);
        assert_eq!(intake.len(), 3);
        assert_eq!(intake.get(1), Some(&replaced));
    }

    #[test]
    fn rejects_slot_beyond_next_free_position() {
        let mut intake = filled(2);
        assert!(intake.add_or_replace(4, vec![1], "image/png").is_none());
        assert_eq!(intake.len(), 2);
    }

    #[test]
    fn sixth_append_on_full_store_is_rejected() {
        let mut intake = filled(MAX_PEOPLE);
        assert!(intake
            .add_or_replace(MAX_PEOPLE, vec![1], "image/png")
            .is_none());
        assert_eq!(intake.len(), MAX_PEOPLE);
    }

    #[test]
    fn replace_on_full_store_still_works() {
        let mut intake = filled(MAX_PEOPLE);
        assert!(intake.add_or_replace(2, vec![7], "image/png").is_some());
        assert_eq!(intake.len(), MAX_PEOPLE);
    }

    #[test]
    fn remove_compacts_subsequent_slots() {
        let mut intake = filled(4);
        let third = intake.get(3).expect("slot").id.clone();
        intake.remove(2);
        assert_eq!(intake.len(), 3);
        assert_eq!(intake.get(2).expect("slot").id, third);
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let mut intake = filled(2);
        intake.remove(5);
        assert_eq!(intake.len(), 2);
    }

    #[test]
    fn toggle_reference_face_does_not_clear_other_flags() {
        let mut intake = filled(3);
        let first = intake.get(0).expect("slot").id.clone();
        let second = intake.get(1).expect("slot").id.clone();
        assert!(intake.toggle_reference_face(&first));
        assert!(intake.toggle_reference_face(&second));
        assert!(intake.get(0).expect("slot").reference_face);
        assert!(intake.get(1).expect("slot").reference_face);

        assert!(intake.toggle_reference_face(&second));
        assert!(intake.get(0).expect("slot").reference_face);
        assert!(!intake.get(1).expect("slot").reference_face);
    }

    #[test]
    fn toggle_reference_face_unknown_id_returns_false() {
        let mut intake = filled(1);
        assert!(!intake.toggle_reference_face("missing"));
    }

    #[test]
    fn count_validity_window() {
        for count in 0..=MAX_PEOPLE {
            let intake = filled(count);
            assert_eq!(intake.count_valid(), (2..=5).contains(&count));
        }
    }
}
