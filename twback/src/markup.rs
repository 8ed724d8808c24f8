//! Selector-based queries over fetched markup.
//!
//! The extractors only talk to [`Document`] and [`Element`]; `scraper` stays
//! behind this module.

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// A parsed page or fragment.
pub struct Document {
    html: Html,
}

/// One element of a [`Document`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Selector(format!("{selector}: {e:?}")))
}

fn ensure_not_blank(markup: &str) -> Result<()> {
    if markup.trim().is_empty() {
        Err(Error::MalformedMarkup("document is empty".into()))
    } else {
        Ok(())
    }
}

impl Document {
    /// Parses a full HTML page. Blank input is the one parser fault this
    /// crate reports, as [`Error::MalformedMarkup`].
    pub fn parse(markup: &str) -> Result<Self> {
        ensure_not_blank(markup)?;
        Ok(Self {
            html: Html::parse_document(markup),
        })
    }

    /// Parses an HTML fragment such as a timeline's `items_html`.
    pub fn parse_fragment(markup: &str) -> Result<Self> {
        ensure_not_blank(markup)?;
        Ok(Self {
            html: Html::parse_fragment(markup),
        })
    }

    /// A document with no elements.
    pub fn empty() -> Self {
        Self {
            html: Html::new_document(),
        }
    }

    /// All matches of `selector`, in document order.
    pub fn query(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let compiled = compile(selector)?;
        Ok(self
            .html
            .select(&compiled)
            .map(|inner| Element { inner })
            .collect())
    }

    /// First match of `selector`, or `None` when nothing matches.
    pub fn first(&self, selector: &str) -> Result<Option<Element<'_>>> {
        let compiled = compile(selector)?;
        Ok(self.html.select(&compiled).next().map(|inner| Element { inner }))
    }

    /// First match of `selector`; a miss is a structural fault.
    pub fn require(&self, selector: &str) -> Result<Element<'_>> {
        self.first(selector)?
            .ok_or_else(|| Error::MissingElement(selector.to_string()))
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.first(selector)?.is_some())
    }
}

impl<'a> Element<'a> {
    /// All matches of `selector` among this element's descendants.
    pub fn query(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let compiled = compile(selector)?;
        Ok(self
            .inner
            .select(&compiled)
            .map(|inner| Element { inner })
            .collect())
    }

    pub fn first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let compiled = compile(selector)?;
        Ok(self.inner.select(&compiled).next().map(|inner| Element { inner }))
    }

    pub fn require(&self, selector: &str) -> Result<Element<'a>> {
        self.first(selector)?
            .ok_or_else(|| Error::MissingElement(selector.to_string()))
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(self.first(selector)?.is_some())
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    /// Like [`Element::attribute`], but a missing attribute is a structural fault.
    pub fn require_attribute(&self, name: &str) -> Result<&'a str> {
        self.attribute(name).ok_or_else(|| Error::MissingAttribute {
            element: self.to_string(),
            attribute: name.to_string(),
        })
    }

    /// Rendered text: descendant text with runs of whitespace collapsed and
    /// the ends trimmed.
    pub fn text(&self) -> String {
        self.full_text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Descendant text exactly as it appears in the markup.
    pub fn full_text(&self) -> String {
        self.inner.text().collect()
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.inner.value();
        write!(f, "{}", value.name())?;
        for class in value.classes() {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({self})")
    }
}

#[cfg(test)]
mod local_tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Jack (@jack) | Twitter</title></head>
        <body>
          <div class="card" data-id="7">
            <p class="bio">  hello
                 <a href="/x">world</a> </p>
            <span class="tag">a</span><span class="tag">b</span>
          </div>
        </body></html>"#;

    #[test]
    fn blank_markup_is_malformed() {
        assert!(matches!(
            Document::parse("  \n "),
            Err(Error::MalformedMarkup(_))
        ));
        assert!(matches!(
            Document::parse_fragment(""),
            Err(Error::MalformedMarkup(_))
        ));
    }

    #[test]
    fn query_keeps_document_order() {
        let doc = Document::parse(PAGE).unwrap();
        let tags = doc.query(".tag").unwrap();
        let texts = tags.iter().map(Element::text).collect::<Vec<_>>();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn text_collapses_but_full_text_does_not() {
        let doc = Document::parse(PAGE).unwrap();
        let bio = doc.require(".card .bio").unwrap();
        assert_eq!(bio.text(), "hello world");
        assert!(bio.full_text().starts_with("  hello\n"));
    }

    #[test]
    fn misses_and_attributes() {
        let doc = Document::parse(PAGE).unwrap();
        assert!(doc.first(".nothing").unwrap().is_none());
        assert!(matches!(
            doc.require(".nothing"),
            Err(Error::MissingElement(s)) if s == ".nothing"
        ));

        let card = doc.require(".card").unwrap();
        assert_eq!(card.attribute("data-id"), Some("7"));
        let err = card.require_attribute("data-user-id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Element <div.card> has no `data-user-id` attribute"
        );
        assert!(card.exists("a[href]").unwrap());
    }

    #[test]
    fn bad_selector_is_reported() {
        let doc = Document::empty();
        assert!(matches!(doc.query("li[class*="), Err(Error::Selector(_))));
    }
}
