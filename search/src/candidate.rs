//! Searchable entries for the type and tag pickers.

use inspector_core::{Attributes, DisplayName, TypeInfo, TypeRegistry};

/// One pickable entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub category: String,
    pub synonyms: Vec<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    /// Candidate for a reflected type.
    ///
    /// The category is the module path (`game::actors`), and a
    /// `DisplayName` attribute on the type becomes a synonym.
    pub fn from_type_info(info: &TypeInfo) -> Self {
        let category = info
            .type_path
            .rsplit_once("::")
            .map_or("", |(module, _)| module);
        let mut candidate = Self::new(info.name).with_category(category);
        if let Some(display) = Attributes::new(&info.attributes).get::<DisplayName>() {
            candidate.synonyms.push(display.0.to_owned());
        }
        candidate
    }
}

/// Every type in `registry`, ordered by type path.
pub fn type_candidates(registry: &TypeRegistry) -> Vec<Candidate> {
    registry
        .types()
        .into_iter()
        .map(Candidate::from_type_info)
        .collect()
}

/// Candidates for tag strings. A `Group/Tag` tag is named `Tag` in
/// category `Group`.
pub fn tag_candidates<I, S>(tags: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| {
            let tag = tag.as_ref();
            match tag.rsplit_once('/') {
                Some((group, name)) => Candidate::new(name).with_category(group),
                None => Candidate::new(tag),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let candidate = Candidate::new("Rigidbody")
            .with_category("Physics")
            .with_synonym("Body");
        assert_eq!(candidate.name, "Rigidbody");
        assert_eq!(candidate.category, "Physics");
        assert_eq!(candidate.synonyms, vec!["Body"]);
    }

    #[test]
    fn tags_split_on_last_slash() {
        let tags = tag_candidates(["Enemy/Boss", "Player", "Ui/Menu/Button"]);
        assert_eq!(tags[0], Candidate::new("Boss").with_category("Enemy"));
        assert_eq!(tags[1], Candidate::new("Player"));
        assert_eq!(tags[2].category, "Ui/Menu");
    }
}
