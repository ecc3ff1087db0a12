//! Post body markup.
//!
//! Converts the plain-text dialect used in post files into HTML. The
//! conversion is an ordered list of substitution passes, each a plain string
//! to string function applied to the previous pass's output:
//!
//! 1. bare URLs become links or media embeds ([`embed`])
//! 2. headings, rules, quotes and lists ([`blocks`])
//! 3. bold, italic, fenced and inline code ([`inline`])
//! 4. remaining newlines become `<br>`
//!
//! The order matters: bold runs before italic so `**x**` is not eaten by
//! the single-asterisk rule, and line breaks come last so block markup can
//! still see line boundaries. There is no escaping; every marker is
//! transformed wherever it appears. Rendering is not idempotent.

pub mod blocks;
pub mod embed;
pub mod inline;

pub use embed::Embed;

/// Source of element ids for embeds that have no natural key.
pub trait IdGenerator {
    /// Return a fresh id suffix.
    fn next_id(&mut self) -> String;
}

/// Random 9-character ids drawn from UUID v4.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(9);
        id
    }
}

/// Zero-padded counter ids (`000000001`, `000000002`, ...), for reproducible
/// output.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{:09}", self.next)
    }
}

/// Passes that run after URL embedding, in order.
const PASSES: &[fn(&str) -> String] = &[
    blocks::headings,
    blocks::rules,
    blocks::quotes,
    blocks::ordered_lists,
    blocks::unordered_lists,
    inline::bold,
    inline::italic,
    inline::fenced_code,
    inline::inline_code,
    inline::line_breaks,
];

/// Renders post bodies to HTML.
pub struct Renderer {
    ids: Box<dyn IdGenerator>,
}

impl Renderer {
    /// Renderer with random embed ids.
    pub fn new() -> Self {
        Self::with_ids(RandomIds)
    }

    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        Self { ids: Box::new(ids) }
    }

    /// Convert a raw post body to HTML. Never fails.
    pub fn render(&mut self, body: &str) -> String {
        let text = embed::embed_links(body, self.ids.as_mut());
        PASSES.iter().fold(text, |text, pass| pass(&text))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

/// Convert a raw post body to HTML with random embed ids.
pub fn render(body: &str) -> String {
    Renderer::new().render(body)
}
