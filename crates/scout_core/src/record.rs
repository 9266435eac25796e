use serde::{Deserialize, Serialize};

/// Image host fragments that mark a post as sponsored, in reporting order.
pub const AD_IMAGE_PATTERNS: [&str; 4] = ["firebasestorage", "dinnerqueen", "revu", "cloudfront"];

/// Upper bound (in characters) of the serialized tag list.
pub const TAGS_MAX_CHARS: usize = 255;

/// Title the legacy extractor wrote when a page could not be read.
pub const FAILURE_TITLE: &str = "error";

/// Placeholder for single fields missing from the page.
pub const UNKNOWN_FIELD: &str = "unknown";

const TAG_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AdFlag {
    Present,
    #[default]
    Absent,
}

impl AdFlag {
    /// Storage marker: `O` when sponsored images were found, `X` otherwise.
    pub fn marker(self) -> &'static str {
        match self {
            AdFlag::Present => "O",
            AdFlag::Absent => "X",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "O" => Some(AdFlag::Present),
            "X" => Some(AdFlag::Absent),
            _ => None,
        }
    }
}

/// Fields pulled from one post page, before a Query is attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPost {
    pub post_url: String,
    pub writer: String,
    pub published_date: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub sympathy_count: u32,
    pub ad_image_urls: Vec<String>,
    pub ad_flag: AdFlag,
}

impl ExtractedPost {
    /// True for the textual failure marker of the legacy extractor.
    pub fn is_failure_sentinel(&self) -> bool {
        self.title == FAILURE_TITLE
    }
}

/// One extracted post attributed to the Query that discovered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub post_url: String,
    pub group_label: String,
    pub writer: String,
    pub published_date: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub sympathy_count: u32,
    pub ad_image_urls: Vec<String>,
    pub ad_flag: AdFlag,
}

impl Record {
    pub fn new(post: ExtractedPost, group_label: impl Into<String>) -> Self {
        Self {
            post_url: post.post_url,
            group_label: group_label.into(),
            writer: post.writer,
            published_date: post.published_date,
            title: post.title,
            content: post.content,
            tags: post.tags,
            sympathy_count: post.sympathy_count,
            ad_image_urls: post.ad_image_urls,
            ad_flag: post.ad_flag,
        }
    }

    pub fn tags_text(&self) -> String {
        join_tags(&self.tags)
    }
}

/// Serialize tags as `a, b, c`, cut at [`TAGS_MAX_CHARS`] on a char boundary.
pub fn join_tags(tags: &[String]) -> String {
    let joined = tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR);
    match joined.char_indices().nth(TAGS_MAX_CHARS) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

/// Inverse of [`join_tags`] for rows read back from storage.
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(TAG_SEPARATOR.trim())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Sympathy counters are rendered as text; anything unparsable counts as zero.
pub fn parse_sympathy(text: &str) -> u32 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Pick the sponsored images out of every `img src` on the page.
///
/// Matches are grouped by pattern in [`AD_IMAGE_PATTERNS`] order, so an image
/// hosted under two patterns is listed twice.
pub fn classify_ad_images<'a, I>(srcs: I) -> (Vec<String>, AdFlag)
where
    I: IntoIterator<Item = &'a str>,
{
    let srcs: Vec<&str> = srcs
        .into_iter()
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .collect();
    let matched: Vec<String> = AD_IMAGE_PATTERNS
        .iter()
        .flat_map(|pattern| {
            srcs.iter()
                .filter(move |src| src.contains(pattern))
                .map(|src| src.to_string())
        })
        .collect();
    let flag = if matched.is_empty() {
        AdFlag::Absent
    } else {
        AdFlag::Present
    };
    (matched, flag)
}
