//! Prompt-to-label mapping for zero-shot detection.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered mapping from natural-language prompts to short labels.
///
/// A detection's `class_id` is the index of its prompt in this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ontology {
    entries: Vec<(String, String)>,
}

impl Ontology {
    /// Build an ontology from `(prompt, label)` pairs.
    pub fn new<P, L>(entries: impl IntoIterator<Item = (P, L)>) -> Result<Self>
    where
        P: Into<String>,
        L: Into<String>,
    {
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(p, l)| (p.into().trim().to_string(), l.into().trim().to_string()))
            .collect();
        if entries.is_empty() {
            return Err(Error::Other("ontology needs at least one prompt".into()));
        }
        if let Some((p, _)) = entries.iter().find(|(p, l)| p.is_empty() || l.is_empty()) {
            return Err(Error::Other(format!("invalid ontology entry {:?}", p)));
        }
        Ok(Self { entries })
    }

    /// Parse `prompt=label` specifications, splitting at the last '='.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let entries = specs
            .iter()
            .map(|spec| {
                let spec = spec.as_ref();
                spec.rsplit_once('=')
                    .ok_or_else(|| Error::Other(format!("expected prompt=label, got {:?}", spec)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn prompts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Label of the prompt at `class_id`.
    pub fn label(&self, class_id: usize) -> Option<&str> {
        self.entries.get(class_id).map(|(_, l)| l.as_str())
    }

    /// Index of the first prompt mapped to `label`.
    pub fn class_id(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|(_, l)| l == label)
    }
}

impl Default for Ontology {
    fn default() -> Self {
        Self {
            entries: vec![
                (
                    "text chunk, paragraph or section with just text".to_string(),
                    "text".to_string(),
                ),
                ("image or figure or diagram".to_string(), "image-diagram".to_string()),
                ("table".to_string(), "table".to_string()),
            ],
        }
    }
}

/// Score cut-offs for zero-shot detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Minimum box (objectness) score
    pub box_threshold: f32,
    /// Minimum prompt-token score for assigning a class
    pub text_threshold: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            box_threshold: 0.35,
            text_threshold: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ontology() {
        let ontology = Ontology::default();
        assert_eq!(ontology.len(), 3);
        assert_eq!(ontology.label(0), Some("text"));
        assert_eq!(ontology.class_id("image-diagram"), Some(1));
        assert_eq!(ontology.label(3), None);
    }

    #[test]
    fn test_parse_specs() {
        let ontology = Ontology::parse(&["signature line=signature", "a=b=stamp"]).unwrap();
        let prompts: Vec<_> = ontology.prompts().collect();
        assert_eq!(prompts, vec!["signature line", "a=b"]);
        assert_eq!(ontology.label(1), Some("stamp"));
    }

    #[test]
    fn test_parse_rejects_bad_specs() {
        assert!(Ontology::parse(&["no label here"]).is_err());
        assert!(Ontology::parse(&["=text"]).is_err());
        assert!(Ontology::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn test_default_thresholds() {
        let t = DetectionThresholds::default();
        assert_eq!(t.box_threshold, 0.35);
        assert_eq!(t.text_threshold, 0.25);
    }
}
