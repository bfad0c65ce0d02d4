// FILE: src/core/tags.rs
//! Tag Registry
//!
//! Tags live on folders and on files as `{name, color}` records. Names are
//! trimmed and lowercased, and unique within one owner. Older snapshots
//! stored bare strings; those deserialize into green tags.

use std::collections::{BTreeSet, HashSet};
use serde::{Deserialize, Serialize};
use crate::core::model::Library;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    #[default]
    Green,
    Blue,
    Red,
    Orange,
    Yellow,
    Purple,
    Pink,
    Gray,
}

impl TagColor {
    pub const ALL: [TagColor; 8] = [
        Self::Green, Self::Blue, Self::Red, Self::Orange,
        Self::Yellow, Self::Purple, Self::Pink, Self::Gray,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Gray => "gray",
        }
    }

    /// Case-insensitive lookup; `grey` is accepted for `gray`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name == "grey" {
            return Some(Self::Gray);
        }
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for TagColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTag")]
pub struct Tag {
    pub name: String,
    pub color: TagColor,
}

impl Tag {
    pub fn new(name: &str, color: TagColor) -> Self {
        Self { name: normalize_tag_name(name), color }
    }
}

/// Every shape a tag has been persisted in.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTag {
    Bare(String),
    Record {
        name: String,
        #[serde(default)]
        color: Option<String>,
    },
}

impl From<StoredTag> for Tag {
    fn from(stored: StoredTag) -> Self {
        match stored {
            StoredTag::Bare(name) => Tag::new(&name, TagColor::default()),
            StoredTag::Record { name, color } => {
                let color = color.as_deref().and_then(TagColor::parse).unwrap_or_default();
                Tag::new(&name, color)
            }
        }
    }
}

/// Who a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOwner<'a> {
    Folder(&'a str),
    File(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyScope {
    /// Tag names used on folders only.
    Folders,
    /// Folders and files together.
    All,
}

pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drop empty names and duplicates (first occurrence wins).
/// Returns true if the set changed.
pub(crate) fn normalize_tag_set(tags: &mut Vec<Tag>) -> bool {
    let before = tags.clone();
    let mut seen = HashSet::new();
    tags.retain_mut(|tag| {
        tag.name = normalize_tag_name(&tag.name);
        !tag.name.is_empty() && seen.insert(tag.name.clone())
    });
    *tags != before
}

impl Library {
    pub fn tags_of(&self, owner: TagOwner<'_>) -> Option<&[Tag]> {
        match owner {
            TagOwner::Folder(id) => self.folders.get(id).map(|f| f.tags.as_slice()),
            TagOwner::File(path) => self.files.get(path).map(|e| e.tags.as_slice()),
        }
    }

    fn tags_of_mut(&mut self, owner: TagOwner<'_>) -> Option<&mut Vec<Tag>> {
        match owner {
            TagOwner::Folder(id) => self.folders.get_mut(id).map(|f| &mut f.tags),
            TagOwner::File(path) => self.files.get_mut(path).map(|e| &mut e.tags),
        }
    }

    /// Attach a tag. False for unknown owners, blank names, or a name the
    /// owner already carries (its existing color is kept).
    pub fn add_tag(&mut self, owner: TagOwner<'_>, name: &str, color: TagColor) -> bool {
        let name = normalize_tag_name(name);
        if name.is_empty() {
            return false;
        }
        let Some(tags) = self.tags_of_mut(owner) else {
            tracing::debug!("[Tags] add_tag on unknown owner {:?}", owner);
            return false;
        };
        if tags.iter().any(|t| t.name == name) {
            return false;
        }
        tags.push(Tag { name, color });
        true
    }

    pub fn remove_tag(&mut self, owner: TagOwner<'_>, name: &str) -> bool {
        let name = normalize_tag_name(name);
        let Some(tags) = self.tags_of_mut(owner) else {
            return false;
        };
        let before = tags.len();
        tags.retain(|t| t.name != name);
        tags.len() != before
    }

    /// Recolor a tag the owner already has.
    pub fn set_tag_color(&mut self, owner: TagOwner<'_>, name: &str, color: TagColor) -> bool {
        let name = normalize_tag_name(name);
        let Some(tag) = self.tags_of_mut(owner).and_then(|tags| tags.iter_mut().find(|t| t.name == name)) else {
            return false;
        };
        if tag.color == color {
            return false;
        }
        tag.color = color;
        true
    }

    /// Sorted, de-duplicated tag names for autocomplete.
    pub fn vocabulary(&self, scope: VocabularyScope) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.folders.values()
            .flat_map(|f| f.tags.iter().map(|t| t.name.as_str()))
            .collect();

        if scope == VocabularyScope::All {
            names.extend(self.files.values().flat_map(|e| e.tags.iter().map(|t| t.name.as_str())));
        }

        names.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Library, UNFILED_ID};

    fn library_with_file() -> Library {
        let mut library = Library::new();
        library.add_file("/a.pdf", "a.pdf", UNFILED_ID).unwrap();
        library
    }

    #[test]
    fn add_tag_normalizes_and_deduplicates() {
        let mut library = library_with_file();
        let owner = TagOwner::File("/a.pdf");

        assert!(library.add_tag(owner, "  Physics ", TagColor::Blue));
        assert!(!library.add_tag(owner, "PHYSICS", TagColor::Red));

        let tags = library.tags_of(owner).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "physics");
        assert_eq!(tags[0].color, TagColor::Blue);
    }

    #[test]
    fn add_tag_rejects_blank_and_unknown_owner() {
        let mut library = library_with_file();
        assert!(!library.add_tag(TagOwner::File("/a.pdf"), "   ", TagColor::Green));
        assert!(!library.add_tag(TagOwner::File("/missing.pdf"), "x", TagColor::Green));
        assert!(!library.add_tag(TagOwner::Folder("nope"), "x", TagColor::Green));
    }

    #[test]
    fn removed_tag_can_be_readded_with_new_color() {
        let mut library = library_with_file();
        let owner = TagOwner::Folder(UNFILED_ID);

        assert!(library.add_tag(owner, "todo", TagColor::Green));
        assert!(library.remove_tag(owner, " TODO"));
        assert!(!library.remove_tag(owner, "todo"));
        assert!(library.add_tag(owner, "todo", TagColor::Red));
        assert_eq!(library.tags_of(owner).unwrap()[0].color, TagColor::Red);
    }

    #[test]
    fn set_tag_color_only_touches_existing_tags() {
        let mut library = library_with_file();
        let owner = TagOwner::File("/a.pdf");
        assert!(!library.set_tag_color(owner, "draft", TagColor::Purple));
        library.add_tag(owner, "draft", TagColor::Green);
        assert!(library.set_tag_color(owner, "Draft", TagColor::Purple));
        assert_eq!(library.tags_of(owner).unwrap()[0].color, TagColor::Purple);
    }

    #[test]
    fn vocabulary_respects_scope() {
        let mut library = library_with_file();
        library.add_tag(TagOwner::Folder(UNFILED_ID), "zeta", TagColor::Green);
        library.add_tag(TagOwner::File("/a.pdf"), "alpha", TagColor::Green);
        library.add_tag(TagOwner::File("/a.pdf"), "zeta", TagColor::Green);

        assert_eq!(library.vocabulary(VocabularyScope::Folders), vec!["zeta"]);
        assert_eq!(library.vocabulary(VocabularyScope::All), vec!["alpha", "zeta"]);
    }

    #[test]
    fn legacy_bare_string_tags_deserialize_as_green() {
        let tags: Vec<Tag> = serde_json::from_str(r#"["Reading", {"name": "Work", "color": "BLUE"}, {"name": "x", "color": "chartreuse"}]"#).unwrap();
        assert_eq!(tags[0], Tag { name: "reading".into(), color: TagColor::Green });
        assert_eq!(tags[1], Tag { name: "work".into(), color: TagColor::Blue });
        assert_eq!(tags[2].color, TagColor::Green);
    }

    #[test]
    fn normalize_tag_set_drops_blanks_and_duplicates() {
        let mut tags = vec![
            Tag { name: "A".into(), color: TagColor::Red },
            Tag { name: "a".into(), color: TagColor::Blue },
            Tag { name: " ".into(), color: TagColor::Green },
        ];
        assert!(normalize_tag_set(&mut tags));
        assert_eq!(tags, vec![Tag { name: "a".into(), color: TagColor::Red }]);
        assert!(!normalize_tag_set(&mut tags));
    }

    #[test]
    fn color_parse_is_case_insensitive() {
        assert_eq!(TagColor::parse("Purple"), Some(TagColor::Purple));
        assert_eq!(TagColor::parse("grey"), Some(TagColor::Gray));
        assert_eq!(TagColor::parse("teal"), None);
    }
}
