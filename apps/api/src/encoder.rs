//! Document Encoder — turns one catalog record into the text blob that gets
//! embedded, plus the structured metadata the fallback path renders from.

use serde::{Deserialize, Serialize};

use crate::catalog::AssessmentRecord;

/// Per-document metadata, keyed the way the output contract spells the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub assessment_type: String,
    pub skills: String,
    pub description: String,
    pub duration: String,
    pub remote_testing: String,
    pub adaptive_support: String,
    pub url: String,
}

/// The unit stored in and retrieved from the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDocument {
    /// Catalog row position as a string; stable for a given catalog snapshot.
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Encodes one catalog record. Pure and deterministic: the same record always
/// yields the same document.
///
/// The trailing sentences restate field values in natural language on
/// purpose; the redundancy raises lexical overlap with keyword-style queries
/// and measurably helps embedding similarity.
pub fn encode(row_index: usize, record: &AssessmentRecord) -> EncodedDocument {
    let remote_phrase = if record.remote_testing == "Yes" {
        "supports remote testing"
    } else {
        "does not support remote testing"
    };
    let adaptive_phrase = if record.adaptive_support == "Yes" {
        "has adaptive/IRT support"
    } else {
        "does not have adaptive/IRT support"
    };

    let text = format!(
        "Name: {name}\n\
         Type: {assessment_type}\n\
         Skills: {skills}\n\
         Description: {description}\n\
         Duration: {duration}\n\
         Remote Testing: {remote_testing}\n\
         Adaptive/IRT Support: {adaptive_support}\n\
         URL: {url}\n\
         \n\
         This assessment evaluates {skills} skills and is a {assessment_type} assessment type.\n\
         It takes {duration} to complete and {remote_phrase}. It {adaptive_phrase}.\n\
         \n\
         {description}",
        name = record.name,
        assessment_type = record.assessment_type,
        skills = record.skills,
        description = record.description,
        duration = record.duration,
        remote_testing = record.remote_testing,
        adaptive_support = record.adaptive_support,
        url = record.url,
    );

    EncodedDocument {
        id: row_index.to_string(),
        text,
        metadata: DocumentMetadata {
            name: record.name.clone(),
            assessment_type: record.assessment_type.clone(),
            skills: record.skills.clone(),
            description: record.description.clone(),
            duration: record.duration.clone(),
            remote_testing: record.remote_testing.clone(),
            adaptive_support: record.adaptive_support.clone(),
            url: record.url.clone(),
        },
    }
}
