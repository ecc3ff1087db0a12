//! HTML page assembly: table of contents, article view and deep links.

use std::fmt::Write as _;

use url::Url;
use url::form_urlencoded;

use crate::markup::Renderer;
use crate::post::Post;
use crate::slug::slugify;

/// How article links are written.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStyle {
    /// `?article=<index>&title=<slug>`, for a single page that reads its query.
    #[default]
    Query,
    /// `article-<index>.html`, for statically generated output.
    Files,
}

/// Deep-link parameters read from a page query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// Index into the resolved post list.
    pub article: usize,
    /// Slug of the article title. Display only; never used for lookup.
    pub title: Option<String>,
}

impl Navigation {
    /// Parse `article` and `title` from a query string, with or without the
    /// leading `?`.
    ///
    /// `article` is read from its leading digits, so `2abc` selects post 2.
    /// A missing, negative or non-numeric value selects the first post.
    pub fn from_query(query: &str) -> Self {
        let mut nav = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "article" => nav.article = leading_index(&value),
                "title" if !value.is_empty() => nav.title = Some(value.into_owned()),
                _ => {}
            }
        }
        nav
    }
}

fn leading_index(value: &str) -> usize {
    let value = value.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0)
}

/// Relative link to the article at `index`.
pub fn article_href(links: LinkStyle, index: usize, post: &Post) -> String {
    match links {
        LinkStyle::Query => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("article", &index.to_string())
                .append_pair("title", &slugify(&post.title))
                .finish();
            format!("?{query}")
        }
        LinkStyle::Files => format!("article-{index}.html"),
    }
}

/// Absolute link to the article at `index`, suitable for sharing.
pub fn share_link(base: &Url, index: usize, post: &Post) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("article", &index.to_string())
        .append_pair("title", &slugify(&post.title));
    url
}

/// List of every post with its publication label.
pub fn render_toc(posts: &[Post], links: LinkStyle) -> String {
    let mut html = String::from("<ul>");
    for (index, post) in posts.iter().enumerate() {
        let _ = write!(
            html,
            r#"<li><a href="{}" class="load-post">{}</a> <small>{}</small></li>"#,
            article_href(links, index, post),
            post.title,
            post.published_label
        );
    }
    html.push_str("</ul>");
    html
}

/// Article markup for `posts[index]`, or `None` when out of range.
pub fn render_article(
    posts: &[Post],
    index: usize,
    renderer: &mut Renderer,
    links: LinkStyle,
) -> Option<String> {
    let post = posts.get(index)?;
    let mut html = String::from(r#"<div class="post">"#);
    let _ = write!(
        html,
        r#"<h2>{}</h2><p><small>{}</small></p><div>{}</div>"#,
        post.title,
        post.published_label,
        renderer.render(&post.body)
    );
    let _ = write!(
        html,
        r#"<p><button class="copy-link" data-link="{}">Copy link</button> <button class="speak-text" data-text="{}">Read aloud</button></p>"#,
        article_href(LinkStyle::Query, index, post),
        escape_attr(&post.body)
    );

    html.push_str(r#"<nav class="pager">"#);
    if let Some(prev) = index.checked_sub(1).and_then(|i| posts.get(i).map(|p| (i, p))) {
        let _ = write!(
            html,
            r#"<a class="prev" href="{}">&larr; {}</a>"#,
            article_href(links, prev.0, prev.1),
            prev.1.title
        );
    }
    let _ = write!(html, r#"<span class="page-number">{} / {}</span>"#, index + 1, posts.len());
    if let Some(next) = posts.get(index + 1) {
        let _ = write!(
            html,
            r#"<a class="next" href="{}">{} &rarr;</a>"#,
            article_href(links, index + 1, next),
            next.title
        );
    }
    html.push_str("</nav><hr></div>");
    Some(html)
}

/// Escape `text` for use inside a double-quoted attribute.
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:auto;padding:1rem}\
.embed{position:relative;max-width:100%;text-align:center}\
.embed iframe,.embed video{display:block;margin:0 auto;max-width:100%}\
.embed iframe{width:90%;height:580px}\
audio{width:100%}img{max-width:100%;height:auto}\
.fullscreen{margin-top:5px;background-color:rgba(0,0,0,.7);color:#fff;border:none;padding:5px 10px;border-radius:4px;cursor:pointer}\
.pager{display:flex;gap:1rem;justify-content:space-between}";

const SCRIPT: &str = "function openFullScreen(id){var e=document.getElementById(id);if(!e)return;\
(e.requestFullscreen||e.webkitRequestFullscreen||e.mozRequestFullScreen||e.msRequestFullscreen).call(e);}\
document.querySelectorAll('.copy-link').forEach(function(b){b.addEventListener('click',function(){\
navigator.clipboard.writeText(new URL(b.dataset.link,location.href).href);});});\
document.querySelectorAll('.speak-text').forEach(function(b){b.addEventListener('click',function(){\
if(!window.speechSynthesis)return;speechSynthesis.cancel();\
speechSynthesis.speak(new SpeechSynthesisUtterance(b.dataset.text));});});";

/// A complete HTML document with the table of contents and the article
/// selected by `nav`.
pub fn render_page(
    posts: &[Post],
    nav: &Navigation,
    renderer: &mut Renderer,
    links: LinkStyle,
    site_title: &str,
) -> String {
    let title = nav
        .title
        .as_ref()
        .map_or_else(|| site_title.to_string(), |slug| format!("{slug} | {site_title}"));
    let article = render_article(posts, nav.article, renderer, links)
        .unwrap_or_else(|| r#"<p class="empty">No such article.</p>"#.to_string());

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<nav id=\"toc\">{}</nav>\n<main id=\"blog\">{article}</main>\n<script>{SCRIPT}</script>\n</body>\n</html>\n",
        render_toc(posts, links)
    )
}
