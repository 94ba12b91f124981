use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::options::Options;

use super::Dialect;
use crate::config::DEFAULT_ALLOW_UNSAFE_HTML;

/// Converter settings. The defaults trust authors: raw HTML passes through.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub dialect: Dialect,
    pub allow_unsafe_html: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            allow_unsafe_html: DEFAULT_ALLOW_UNSAFE_HTML,
        }
    }
}

impl From<&crate::config::RenderSettings> for ConverterConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            dialect: settings.dialect,
            allow_unsafe_html: settings.allow_unsafe_html,
        }
    }
}

pub(crate) fn build_options(config: &ConverterConfig) -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options, config.dialect);
    configure_render(&mut options, config.allow_unsafe_html);
    options
}

fn configure_extensions(options: &mut Options<'static>, dialect: Dialect) {
    if dialect == Dialect::Basic {
        return;
    }

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.description_lists = true;
    ext.superscript = true;
}

fn configure_render(options: &mut Options<'static>, allow_unsafe_html: bool) {
    let render = &mut options.render;
    render.r#unsafe = allow_unsafe_html;
    render.escape = !allow_unsafe_html;
    render.tasklist_classes = true;
    render.gfm_quirks = true;
}

/// Allowlist covering the elements Markdown itself can produce. Applied only
/// when raw HTML is disallowed; the pass-through path never sanitises.
pub(crate) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "code",
        "dd",
        "del",
        "div",
        "dl",
        "dt",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "img",
        "input",
        "li",
        "ol",
        "p",
        "pre",
        "section",
        "span",
        "strong",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
        "data-footnote-backref-idx",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["title", "width", "height", "alt", "loading"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("pre", &["class"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled", "class"]);

    builder.add_url_schemes(["http", "https", "mailto", "tel"].iter().copied());

    builder
}
