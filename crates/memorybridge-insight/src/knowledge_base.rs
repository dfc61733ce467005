//! Markdown knowledge base for the voice companion.
//!
//! Photo memories are grouped into era sections in a fixed life order,
//! sorted by date inside each section, and rendered as one markdown
//! document. The voice agent platform caps uploads at 50 KB, so oversized
//! documents are cut and marked.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use memorybridge_core::config::KnowledgeBaseConfig;
use memorybridge_core::types::PhotoRecord;
use memorybridge_vector::store::MemoryStore;

use crate::error::InsightError;

/// Default document cap in kilobytes.
pub const DEFAULT_MAX_KB: usize = 50;

/// Default caption length inside the document.
pub const CAPTION_SUMMARY_MAX_CHARS: usize = 200;

const PLACEHOLDER: &str = "...";
const NOTICE_RESERVE: usize = 80;
const FALLBACK_SECTION: &str = "Memories";

/// Era codes as stored with photos, mapped to section headings.
pub const ERA_LABELS: &[(&str, &str)] = &[
    ("1940s", "Childhood (1940s-1960s)"),
    ("1950s", "Childhood (1940s-1960s)"),
    ("1960s", "Childhood (1940s-1960s)"),
    ("1970s", "Family Years (1970s-1990s)"),
    ("1980s", "Family Years (1970s-1990s)"),
    ("1990s", "Family Years (1970s-1990s)"),
    ("2000s", "Career & Later Life (2000s-2010s)"),
    ("2010s", "Career & Later Life (2000s-2010s)"),
    ("2020s", "Recent Memories (2020s)"),
    ("childhood", "Childhood (1940s-1960s)"),
    ("young-adult", "Young Adult Years"),
    ("family", "Family Years (1970s-1990s)"),
    ("recent", "Recent Memories (2020s)"),
    ("unknown", FALLBACK_SECTION),
];

/// Section order in the document; anything else follows alphabetically.
const ERA_ORDER: &[&str] = &[
    "Childhood (1940s-1960s)",
    "Family Years (1970s-1990s)",
    "Career & Later Life (2000s-2010s)",
    "Recent Memories (2020s)",
    FALLBACK_SECTION,
];

/// Section heading for an era code. Unmapped codes are used as-is; an empty
/// code is treated as "unknown".
pub fn era_label(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return FALLBACK_SECTION.to_string();
    }
    ERA_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

fn era_rank(era: &str) -> usize {
    ERA_ORDER
        .iter()
        .position(|canonical| {
            let first_word = canonical.split(' ').next().unwrap_or(canonical);
            era == *canonical || era.starts_with(first_word)
        })
        .unwrap_or(ERA_ORDER.len())
}

/// One captioned photo as it appears in the knowledge base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMemory {
    /// ISO-8601 or partial date; sorted as a plain string.
    pub date: String,
    pub caption: String,
    /// Section heading, e.g. "Childhood (1940s-1960s)".
    pub era: String,
    #[serde(default)]
    pub photo_url: String,
}

impl PhotoMemory {
    /// Convert a stored photo, mapping its era code to a section heading.
    /// Photos with a blank caption give `None`.
    pub fn from_record(record: &PhotoRecord) -> Option<Self> {
        let caption = record.caption.trim();
        if caption.is_empty() {
            return None;
        }
        Some(Self {
            date: record.date.clone(),
            caption: caption.to_string(),
            era: era_label(&record.era),
            photo_url: record.photo_url.clone(),
        })
    }
}

/// Result of a successful size check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseCheck {
    /// Document length in characters.
    pub size_chars: usize,
    /// True above 90% of the cap.
    pub near_limit: bool,
}

/// Shorten `caption` to at most `max_chars` characters on word boundaries.
///
/// Captions that already fit are returned unchanged. Otherwise whitespace is
/// collapsed and as many whole words as fit alongside `...` are kept.
pub fn summarize_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }

    let collapsed = caption.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let budget = max_chars.saturating_sub(PLACEHOLDER.len());
    let mut out = String::new();
    let mut len = 0usize;
    for word in collapsed.split(' ') {
        let sep = usize::from(!out.is_empty());
        let word_len = word.chars().count();
        if len + sep + word_len > budget {
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        len += sep + word_len;
    }
    out.push_str(PLACEHOLDER);
    out
}

/// Renders and checks knowledge base documents against a size cap.
#[derive(Clone, Debug)]
pub struct KnowledgeBaseBuilder {
    max_kb: usize,
    caption_max_chars: usize,
}

impl Default for KnowledgeBaseBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KB)
    }
}

impl KnowledgeBaseBuilder {
    pub fn new(max_kb: usize) -> Self {
        Self {
            max_kb,
            caption_max_chars: CAPTION_SUMMARY_MAX_CHARS,
        }
    }

    pub fn from_config(config: &KnowledgeBaseConfig) -> Self {
        Self::new(config.max_kb)
    }

    pub fn with_caption_max_chars(mut self, max_chars: usize) -> Self {
        self.caption_max_chars = max_chars;
        self
    }

    /// Document cap in characters.
    pub fn max_chars(&self) -> usize {
        self.max_kb * 1024
    }

    /// Render the document for `person_name`.
    pub fn build(&self, person_name: &str, memories: &[PhotoMemory]) -> String {
        if memories.is_empty() {
            warn!(person = person_name, "Building knowledge base with no memories");
            return format!(
                "# {}'s Life Memories\n\nNo memories have been added yet.\n",
                person_name
            );
        }

        // Sections in first-seen order before sorting, so equal ranks stay put.
        let mut sections: Vec<(&str, Vec<&PhotoMemory>)> = Vec::new();
        for memory in memories {
            match sections.iter_mut().find(|(era, _)| *era == memory.era) {
                Some((_, entries)) => entries.push(memory),
                None => sections.push((memory.era.as_str(), vec![memory])),
            }
        }
        for (_, entries) in &mut sections {
            entries.sort_by(|a, b| a.date.cmp(&b.date));
        }
        sections.sort_by(|(a, _), (b, _)| era_rank(a).cmp(&era_rank(b)).then_with(|| a.cmp(b)));

        let mut lines = vec![
            format!("# {}'s Life Memories", person_name),
            String::new(),
            format!(
                "This document contains photo memories for {}, organized chronologically \
                 for use by the MemoryBridge voice companion.",
                person_name
            ),
            String::new(),
        ];
        for (era, entries) in &sections {
            lines.push(format!("## {}", era));
            lines.push(String::new());
            for memory in entries {
                let date = if memory.date.is_empty() {
                    "Unknown date"
                } else {
                    memory.date.as_str()
                };
                lines.push(format!(
                    "- **{}**: {}",
                    date,
                    summarize_caption(&memory.caption, self.caption_max_chars)
                ));
            }
            lines.push(String::new());
        }
        let mut document = lines.join("\n");

        let size = document.chars().count();
        if size > self.max_chars() {
            warn!(
                person = person_name,
                size,
                max_chars = self.max_chars(),
                "Knowledge base over size limit, truncating"
            );
            let cutoff = self.max_chars().saturating_sub(NOTICE_RESERVE);
            if let Some((byte_idx, _)) = document.char_indices().nth(cutoff) {
                document.truncate(byte_idx);
            }
            document.push_str(&format!(
                "\n\n[Additional memories not shown \u{2014} {} KB knowledge base size limit reached]",
                self.max_kb
            ));
        }

        info!(
            person = person_name,
            eras = sections.len(),
            memories = memories.len(),
            chars = document.chars().count(),
            "Built knowledge base"
        );
        document
    }

    /// Check that `content` is non-empty and within the cap.
    pub fn validate(&self, content: &str) -> Result<KnowledgeBaseCheck, InsightError> {
        let size = content.chars().count();
        if size == 0 {
            return Err(InsightError::EmptyDocument);
        }
        let limit = self.max_chars();
        if size > limit {
            return Err(InsightError::TooLarge { size, limit });
        }

        let near_limit = size as f64 > limit as f64 * 0.9;
        if near_limit {
            warn!(
                size_kb = size as f64 / 1024.0,
                max_kb = self.max_kb,
                "Knowledge base approaching size limit"
            );
        }
        Ok(KnowledgeBaseCheck {
            size_chars: size,
            near_limit,
        })
    }

    /// Fetch the photos of `memory_id`, build the document and log the
    /// size check. A failed check is logged, not returned.
    pub async fn build_from_store<S: MemoryStore>(
        &self,
        store: &S,
        memory_id: &str,
        person_name: &str,
    ) -> Result<String, InsightError> {
        info!(memory_id, person = person_name, "Fetching memories for knowledge base");
        let photos = store.fetch_photos(memory_id).await?;

        let memories: Vec<PhotoMemory> = photos
            .iter()
            .filter_map(|photo| {
                let memory = PhotoMemory::from_record(photo);
                if memory.is_none() {
                    debug!(memory_id, "Skipped photo with empty caption");
                }
                memory
            })
            .collect();
        info!(
            memory_id,
            converted = memories.len(),
            photos = photos.len(),
            "Converted photos to knowledge base entries"
        );

        let document = self.build(person_name, &memories);
        match self.validate(&document) {
            Ok(check) => info!(
                memory_id,
                size_chars = check.size_chars,
                near_limit = check.near_limit,
                "Knowledge base validated"
            ),
            Err(e) => warn!(memory_id, error = %e, "Knowledge base failed validation"),
        }
        Ok(document)
    }
}

/// [`KnowledgeBaseBuilder::build`] with the default 50 KB cap.
pub fn build_knowledge_base(person_name: &str, memories: &[PhotoMemory]) -> String {
    KnowledgeBaseBuilder::default().build(person_name, memories)
}

/// [`KnowledgeBaseBuilder::validate`] with the default 50 KB cap.
pub fn validate_knowledge_base(content: &str) -> Result<KnowledgeBaseCheck, InsightError> {
    KnowledgeBaseBuilder::default().validate(content)
}
