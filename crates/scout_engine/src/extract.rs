use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use scout_core::{classify_ad_images, parse_sympathy, ExtractedPost, UNKNOWN_FIELD};

use crate::ExtractError;

const TITLE: &str = "div.se-module.se-module-text.se-title-text > p > span";
const MAIN_BLOCKS: &str = "div.se-main-container > div";
const MAIN_CONTAINER: &str = "div.se-main-container";
const VIDEO_BLOCK: &str = "div.se-module.se-module-video.__se-component";
const HASH_TAG: &str = "span.__se-hash-tag";
const PUBLISH_DATE: &str = "span.se_publishDate";
const WRITER: &str = "span.nick > a.link";
const TAGS: &str = "div.wrap_tag span.ell";
const SYMPATHY: &str = "span.u_likeit_list_btn._button.btn_sympathy.pcol2.off > em.u_cnt._count";
const IMAGES: &str = "img[src]";
const CONTENT_FRAME: &str = "iframe#mainFrame";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector `{css}`: {message}")]
pub struct SelectorError {
    pub css: &'static str,
    pub message: String,
}

fn selector(css: &'static str) -> Result<Selector, SelectorError> {
    Selector::parse(css).map_err(|err| SelectorError {
        css,
        message: err.to_string(),
    })
}

/// Turns a rendered post document into structured fields.
pub trait PostExtractor: Send + Sync {
    fn extract(&self, html: &str, post_url: &str) -> Result<ExtractedPost, ExtractError>;
}

/// Extractor for posts written with the SmartEditor blog layout.
#[derive(Debug)]
pub struct SmartEditorExtractor {
    title: Selector,
    main_blocks: Selector,
    main_container: Selector,
    excluded: Vec<Selector>,
    publish_date: Selector,
    writer: Selector,
    tags: Selector,
    sympathy: Selector,
    images: Selector,
}

impl SmartEditorExtractor {
    pub fn new() -> Result<Self, SelectorError> {
        Ok(Self {
            title: selector(TITLE)?,
            main_blocks: selector(MAIN_BLOCKS)?,
            main_container: selector(MAIN_CONTAINER)?,
            excluded: vec![selector(VIDEO_BLOCK)?, selector(HASH_TAG)?],
            publish_date: selector(PUBLISH_DATE)?,
            writer: selector(WRITER)?,
            tags: selector(TAGS)?,
            sympathy: selector(SYMPATHY)?,
            images: selector(IMAGES)?,
        })
    }

    fn first_text(&self, doc: &Html, sel: &Selector) -> Option<String> {
        doc.select(sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    fn body_text(&self, doc: &Html) -> String {
        doc.select(&self.main_blocks)
            .filter(|block| !self.is_excluded(block))
            .map(|block| {
                let mut text = String::new();
                collect_stripped_text(*block, &self.excluded, &mut text);
                text
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_excluded(&self, element: &ElementRef) -> bool {
        self.excluded.iter().any(|sel| sel.matches(element))
    }
}

impl PostExtractor for SmartEditorExtractor {
    fn extract(&self, html: &str, post_url: &str) -> Result<ExtractedPost, ExtractError> {
        let doc = Html::parse_document(html);

        let title = self.first_text(&doc, &self.title);
        let has_body = doc.select(&self.main_container).next().is_some();
        if title.is_none() && !has_body {
            return Err(ExtractError::transient(format!(
                "post content not rendered for {post_url}"
            )));
        }

        let tags = doc
            .select(&self.tags)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        let sympathy_count = self
            .first_text(&doc, &self.sympathy)
            .map(|text| parse_sympathy(&text))
            .unwrap_or(0);
        let (ad_image_urls, ad_flag) =
            classify_ad_images(doc.select(&self.images).filter_map(|img| img.value().attr("src")));
        let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN_FIELD.to_string());

        Ok(ExtractedPost {
            post_url: post_url.to_string(),
            writer: or_unknown(self.first_text(&doc, &self.writer)),
            published_date: or_unknown(self.first_text(&doc, &self.publish_date)),
            title: or_unknown(title),
            content: self.body_text(&doc),
            tags,
            sympathy_count,
            ad_image_urls,
            ad_flag,
        })
    }
}

/// Append every text node under `node`, each trimmed, skipping subtrees that
/// match one of `skip`.
fn collect_stripped_text(node: NodeRef<'_, Node>, skip: &[Selector], out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text.trim()),
            Node::Element(_) => {
                let skipped = ElementRef::wrap(child)
                    .map(|el| skip.iter().any(|sel| sel.matches(&el)))
                    .unwrap_or(false);
                if !skipped {
                    collect_stripped_text(child, skip, out);
                }
            }
            _ => {}
        }
    }
}

/// Source of the `mainFrame` iframe that carries the post body, if the
/// document is only the outer blog shell.
pub fn content_frame_url(html: &str, base_url: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let frame = Selector::parse(CONTENT_FRAME).ok()?;
    let src = doc.select(&frame).next()?.value().attr("src")?.trim().to_string();
    if src.is_empty() {
        return None;
    }
    let base = url::Url::parse(base_url).ok()?;
    base.join(&src).ok().map(|url| url.to_string())
}
