use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attendee {
    pub name: String,
    pub company: String,
    pub role: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetails {
    pub name: String,
    pub company: String,
    pub phone: String,
    pub email: String,
}

/// Sign-off by one approval role. `signature` holds a data URI or is empty
/// when not captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Approval {
    pub name: String,
    pub date: String,
    pub accepted: bool,
    pub comments: String,
    pub signature: String,
}

impl Approval {
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.date.trim().is_empty()
            && !self.accepted
            && self.comments.trim().is_empty()
            && self.signature.is_empty()
    }
}

/// A labelled set of captured images (photos or drawings) borrowed from a form.
pub struct ImageCollection<'a> {
    pub label: &'static str,
    pub images: Vec<&'a str>,
}

impl<'a> ImageCollection<'a> {
    pub fn single(label: &'static str, image: &'a str) -> Self {
        Self { label, images: non_empty(std::iter::once(image)) }
    }

    pub fn many(label: &'static str, images: &'a [String]) -> Self {
        Self { label, images: non_empty(images.iter().map(String::as_str)) }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn non_empty<'a>(it: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    it.filter(|s| !s.trim().is_empty()).collect()
}

pub(crate) fn yes_no(flag: bool) -> String {
    if flag { "Yes".to_string() } else { "No".to_string() }
}
