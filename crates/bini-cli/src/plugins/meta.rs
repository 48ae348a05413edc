//! Page metadata injection.
//!
//! The root layout exports a `metadata` object. Its fields are turned into
//! `<meta>`, `<title>` and `<link>` tags and written into `index.html`
//! between the `<!-- BINI_META_TAGS -->` and `<!-- /BINI_META_TAGS -->`
//! markers, so Vite serves and builds the page with them.

use bini_router::{DevPlugin, HotUpdate, RouterConfig, RouterError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const META_START: &str = "<!-- BINI_META_TAGS -->";
pub const META_END: &str = "<!-- /BINI_META_TAGS -->";

const LAYOUT_FILES: [&str; 2] = ["layout.tsx", "layout.jsx"];

const DEFAULT_TITLE: &str = "Bini.js App";
const DEFAULT_DESCRIPTION: &str = "Modern React application built with Bini.js";
const DEFAULT_VIEWPORT: &str = "width=device-width, initial-scale=1.0";

/// Open Graph or Twitter card fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub creator: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Icons {
    pub icon: Option<String>,
    pub shortcut: Option<String>,
    pub apple: Option<String>,
}

/// Metadata exported by the root layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: Option<String>,
    pub viewport: String,
    pub open_graph: Option<SocialCard>,
    pub twitter: Option<SocialCard>,
    pub icons: Icons,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            keywords: Vec::new(),
            author: None,
            viewport: DEFAULT_VIEWPORT.to_string(),
            open_graph: None,
            twitter: None,
            icons: Icons::default(),
        }
    }
}

/// Extract `export const metadata = { ... }` from layout source.
///
/// Only literal strings and string arrays are understood; anything else
/// keeps its default.
pub fn parse_metadata(source: &str) -> Metadata {
    let mut meta = Metadata::default();
    let Some(body) = metadata_object(source) else {
        return meta;
    };
    let top = blank_nested_objects(body);

    if let Some(title) = string_prop(&top, "title") {
        meta.title = title;
    }
    if let Some(description) = string_prop(&top, "description") {
        meta.description = description;
    }
    if let Some(viewport) = string_prop(&top, "viewport") {
        meta.viewport = viewport;
    }
    if let Some(keywords) = array_prop(&top, "keywords") {
        meta.keywords = keywords;
    }
    meta.author = Regex::new(r#"authors\s*:\s*\[\s*\{\s*name\s*:\s*['"]([^'"]+)['"]"#)
        .ok()
        .and_then(|re| re.captures(body).map(|c| c[1].to_string()));

    meta.open_graph = object_prop(body, "openGraph").map(|obj| social_card(&obj));
    meta.twitter = object_prop(body, "twitter").map(|obj| social_card(&obj));
    if let Some(obj) = object_prop(body, "icons") {
        meta.icons = Icons {
            icon: string_prop(&obj, "icon"),
            shortcut: string_prop(&obj, "shortcut"),
            apple: string_prop(&obj, "apple"),
        };
    }

    meta
}

/// Text between the braces of the exported `metadata` object.
fn metadata_object(source: &str) -> Option<&str> {
    let re = Regex::new(r"export\s+const\s+metadata\s*(?::[^=]+)?=\s*\{").ok()?;
    let open = re.find(source)?.end() - 1;

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Replace the contents of nested `{...}` blocks with spaces so top-level
/// lookups cannot match fields of `openGraph` or `twitter`.
fn blank_nested_objects(body: &str) -> String {
    let mut depth = 0usize;
    body.chars()
        .map(|c| match c {
            '{' => {
                depth += 1;
                c
            }
            '}' => {
                depth = depth.saturating_sub(1);
                c
            }
            _ if depth > 0 => ' ',
            _ => c,
        })
        .collect()
}

fn string_prop(src: &str, prop: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\b{}\s*:\s*['"]([^'"]+)['"]"#, regex::escape(prop))).ok()?;
    re.captures(src).map(|c| c[1].to_string())
}

fn array_prop(src: &str, prop: &str) -> Option<Vec<String>> {
    let re = Regex::new(&format!(r"\b{}\s*:\s*\[([^\]]*)\]", regex::escape(prop))).ok()?;
    let items = re.captures(src)?;
    let item = Regex::new(r#"['"]([^'"]+)['"]"#).ok()?;
    Some(
        item.captures_iter(&items[1])
            .map(|c| c[1].to_string())
            .collect(),
    )
}

fn object_prop(src: &str, prop: &str) -> Option<String> {
    let re = Regex::new(&format!(r"\b{}\s*:\s*\{{([^}}]*)\}}", regex::escape(prop))).ok()?;
    re.captures(src).map(|c| c[1].to_string())
}

fn social_card(obj: &str) -> SocialCard {
    SocialCard {
        title: string_prop(obj, "title"),
        description: string_prop(obj, "description"),
        url: string_prop(obj, "url"),
        creator: string_prop(obj, "creator"),
        images: array_prop(obj, "images").unwrap_or_default(),
    }
}

/// Render the head tags for `meta`, one per line, unindented.
pub fn render_tags(meta: &Metadata) -> Vec<String> {
    let mut tags = vec![
        format!(r#"<meta name="viewport" content="{}" />"#, escape(&meta.viewport)),
        format!("<title>{}</title>", escape(&meta.title)),
        format!(r#"<meta name="description" content="{}" />"#, escape(&meta.description)),
    ];

    if !meta.keywords.is_empty() {
        tags.push(format!(
            r#"<meta name="keywords" content="{}" />"#,
            escape(&meta.keywords.join(", "))
        ));
    }
    if let Some(ref author) = meta.author {
        tags.push(format!(r#"<meta name="author" content="{}" />"#, escape(author)));
    }

    if let Some(og) = meta.open_graph.as_ref() {
        if let Some(ref title) = og.title {
            let description = og.description.as_deref().unwrap_or(&meta.description);
            tags.push(format!(r#"<meta property="og:title" content="{}" />"#, escape(title)));
            tags.push(format!(
                r#"<meta property="og:description" content="{}" />"#,
                escape(description)
            ));
            tags.push(r#"<meta property="og:type" content="website" />"#.to_string());
            if let Some(ref url) = og.url {
                tags.push(format!(r#"<meta property="og:url" content="{}" />"#, escape(url)));
            }
            tags.push(format!(r#"<meta property="og:site_name" content="{}" />"#, escape(title)));
            if let Some(image) = og.images.first() {
                tags.push(format!(r#"<meta property="og:image" content="{}" />"#, escape(image)));
                tags.push(format!(r#"<meta property="og:image:alt" content="{}" />"#, escape(title)));
            }
        }
    }

    if let Some(twitter) = meta.twitter.as_ref() {
        if let Some(ref title) = twitter.title {
            let description = twitter.description.as_deref().unwrap_or(&meta.description);
            tags.push(r#"<meta name="twitter:card" content="summary_large_image" />"#.to_string());
            tags.push(format!(r#"<meta name="twitter:title" content="{}" />"#, escape(title)));
            tags.push(format!(
                r#"<meta name="twitter:description" content="{}" />"#,
                escape(description)
            ));
            if let Some(ref creator) = twitter.creator {
                tags.push(format!(r#"<meta name="twitter:creator" content="{}" />"#, escape(creator)));
            }
            if let Some(image) = twitter.images.first() {
                tags.push(format!(r#"<meta name="twitter:image" content="{}" />"#, escape(image)));
            }
        }
    }

    if let Some(ref icon) = meta.icons.icon {
        tags.push(format!(r#"<link rel="icon" href="{}" />"#, escape(icon)));
    }
    if let Some(ref shortcut) = meta.icons.shortcut {
        tags.push(format!(r#"<link rel="shortcut icon" href="{}" />"#, escape(shortcut)));
    }
    if let Some(ref apple) = meta.icons.apple {
        tags.push(format!(r#"<link rel="apple-touch-icon" href="{}" />"#, escape(apple)));
    }

    tags.push(r##"<meta name="theme-color" content="#00CFFF" />"##.to_string());
    tags.push(r#"<meta name="robots" content="index, follow" />"#.to_string());
    if let Some(url) = meta.open_graph.as_ref().and_then(|og| og.url.as_ref()) {
        tags.push(format!(r#"<link rel="canonical" href="{}" />"#, escape(url)));
    }

    tags
}

/// HTML text and attribute escaping.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace the marked region of `html` with `tags`.
///
/// Returns `None` when `html` has no start marker. A start marker without
/// an end marker gets one, so the next injection replaces the same region.
pub fn inject(html: &str, tags: &[String]) -> Option<String> {
    let start = html.find(META_START)?;
    let after_start = start + META_START.len();
    let end = html[after_start..]
        .find(META_END)
        .map(|offset| after_start + offset + META_END.len())
        .unwrap_or(after_start);

    let line_start = html[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let indent: String = html[line_start..start]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(html.len() + tags.iter().map(|t| t.len() + 8).sum::<usize>());
    out.push_str(&html[..after_start]);
    for tag in tags {
        out.push('\n');
        out.push_str(&indent);
        out.push_str(tag);
    }
    out.push('\n');
    out.push_str(&indent);
    out.push_str(META_END);
    out.push_str(&html[end..]);
    Some(out)
}

/// Keeps the head tags of `index.html` in sync with the root layout.
pub struct MetaTagsPlugin {
    index_html: PathBuf,
    pages_root: PathBuf,
}

impl MetaTagsPlugin {
    pub fn new(router: &RouterConfig) -> Self {
        Self {
            index_html: router.root.join("index.html"),
            pages_root: router.pages_root(),
        }
    }

    /// The root layout file, if one exists.
    pub fn layout_file(&self) -> Option<PathBuf> {
        LAYOUT_FILES
            .iter()
            .map(|name| self.pages_root.join(name))
            .find(|path| path.is_file())
    }

    fn is_layout(&self, file: &Path) -> bool {
        LAYOUT_FILES.iter().any(|name| file == self.pages_root.join(name))
    }

    /// Current layout metadata, or the defaults.
    pub fn metadata(&self) -> Metadata {
        let Some(layout) = self.layout_file() else {
            return Metadata::default();
        };
        match fs::read_to_string(&layout) {
            Ok(source) => parse_metadata(&source),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", layout.display(), e);
                Metadata::default()
            }
        }
    }

    /// Rewrite the marked region of `index.html`.
    ///
    /// Returns whether the file changed.
    pub fn write(&self) -> bini_router::Result<bool> {
        if !self.index_html.is_file() {
            tracing::debug!("No {}, skipping meta tags", self.index_html.display());
            return Ok(false);
        }
        let html = fs::read_to_string(&self.index_html)
            .map_err(|e| RouterError::read(&self.index_html, e))?;

        let Some(updated) = inject(&html, &render_tags(&self.metadata())) else {
            tracing::debug!("{} has no {} marker", self.index_html.display(), META_START);
            return Ok(false);
        };
        if updated == html {
            return Ok(false);
        }

        fs::write(&self.index_html, updated).map_err(|e| RouterError::write(&self.index_html, e))?;
        tracing::info!("Updated meta tags in {}", self.index_html.display());
        Ok(true)
    }
}

impl DevPlugin for MetaTagsPlugin {
    fn name(&self) -> &'static str {
        "bini-meta-tags"
    }

    fn config(&self) -> bini_router::Result<()> {
        self.write().map(|_| ())
    }

    fn build_start(&self) -> bini_router::Result<()> {
        self.write().map(|_| ())
    }

    fn handle_hot_update(&self, file: &Path) -> HotUpdate {
        if self.is_layout(file) {
            if let Err(e) = self.write() {
                tracing::warn!("Failed to update meta tags: {}", e);
            }
        }
        // The layout reload plugin decides what clients do
        HotUpdate::Default
    }
}
