//! Main-content sanitizer
//!
//! Turns raw markup into the readable body text of a page:
//! - Removes boilerplate elements, deny-listed widgets and comments
//! - Locates the main content through ordered locator strategies
//! - Normalizes whitespace and drops short or interface-only lines

use crate::extract::patterns::PatternTables;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Elements never removed by the class/id deny list
const PROTECTED_ELEMENTS: &[&str] = &["html", "head", "body"];

/// Elements that start a new line in extracted text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Compiled form of [`PatternTables`]
#[derive(Debug, Clone)]
pub struct Sanitizer {
    removed: Vec<Selector>,
    denied_substrings: Vec<String>,
    strategies: Vec<Vec<Selector>>,
    skip_lines: Vec<Regex>,
    min_element_length: usize,
    min_strategy_length: usize,
    min_line_length: usize,
    line_breaks: Regex,
    inline_space: Regex,
    blank_lines: Regex,
}

impl Sanitizer {
    /// Compiles the tables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for a selector or regular
    /// expression that does not parse.
    pub fn new(tables: PatternTables) -> Result<Self, ConfigError> {
        let removed = tables
            .removed_selectors
            .iter()
            .map(|css| compile_selector(css))
            .collect::<Result<Vec<_>, _>>()?;

        let strategies = tables
            .locator_strategies
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|css| compile_selector(css))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let skip_lines = tables
            .skip_line_patterns
            .iter()
            .map(|pattern| compile_regex(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            removed,
            denied_substrings: tables
                .denied_substrings
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            strategies,
            skip_lines,
            min_element_length: tables.min_element_length,
            min_strategy_length: tables.min_strategy_length,
            min_line_length: tables.min_line_length,
            line_breaks: compile_regex(r"\r\n?")?,
            inline_space: compile_regex(r"[ \t\u{a0}]+")?,
            blank_lines: compile_regex(r"\n[ \t]*(\n[ \t]*)+")?,
        })
    }

    /// Extracts the cleaned main text of a page
    ///
    /// Deterministic for a given input; an empty string is a valid result.
    pub fn sanitize(&self, raw_markup: &str) -> String {
        let mut document = Html::parse_document(raw_markup);
        self.strip_unwanted(&mut document);

        let text = match self.locate_main_text(&document) {
            Some(text) => text,
            None => {
                tracing::debug!("No locator strategy matched, using all visible text");
                visible_text(document.root_element())
            }
        };

        self.filter_lines(&self.normalize_whitespace(&text))
    }

    /// Detaches removed elements, deny-listed widgets and comment nodes
    fn strip_unwanted(&self, document: &mut Html) {
        let mut doomed = Vec::new();

        for selector in &self.removed {
            doomed.extend(document.select(selector).map(|element| element.id()));
        }

        for node in document.tree.root().descendants() {
            if node.value().is_comment() {
                doomed.push(node.id());
                continue;
            }
            if let Some(element) = ElementRef::wrap(node) {
                if self.is_denied(element) {
                    doomed.push(element.id());
                }
            }
        }

        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    /// True if the element's class or id carries a deny-listed substring
    fn is_denied(&self, element: ElementRef) -> bool {
        let value = element.value();
        if PROTECTED_ELEMENTS.contains(&value.name()) {
            return false;
        }

        let class = value.attr("class").unwrap_or_default().to_lowercase();
        let id = value.attr("id").unwrap_or_default().to_lowercase();
        if class.is_empty() && id.is_empty() {
            return false;
        }

        self.denied_substrings
            .iter()
            .any(|needle| class.contains(needle.as_str()) || id.contains(needle.as_str()))
    }

    /// Runs the locator strategies in order, returning the first accepted text
    fn locate_main_text(&self, document: &Html) -> Option<String> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            let mut accepted = HashSet::new();
            let mut texts = Vec::new();

            // Document order, so an accepted ancestor is seen before its descendants
            for node in document.root_element().descendants() {
                let Some(element) = ElementRef::wrap(node) else {
                    continue;
                };
                if !strategy.iter().any(|selector| selector.matches(&element)) {
                    continue;
                }
                if element.ancestors().any(|ancestor| accepted.contains(&ancestor.id())) {
                    continue;
                }

                let text = visible_text(element);
                if char_len(text.trim()) > self.min_element_length {
                    accepted.insert(element.id());
                    texts.push(text);
                }
            }

            let aggregate = texts.join("\n\n");
            if char_len(aggregate.trim()) > self.min_strategy_length {
                tracing::trace!(
                    "Locator strategy {} accepted {} elements",
                    index,
                    texts.len()
                );
                return Some(aggregate);
            }
        }

        None
    }

    /// Unifies line endings and collapses runs of spaces and blank lines
    pub fn normalize_whitespace(&self, text: &str) -> String {
        let text = self.line_breaks.replace_all(text, "\n");
        let text = self.inline_space.replace_all(&text, " ");
        self.blank_lines.replace_all(&text, "\n\n").into_owned()
    }

    /// Keeps substantial lines that are not interface chrome
    pub fn filter_lines(&self, text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|line| char_len(line) > self.min_line_length)
            .filter(|line| {
                let lower = line.to_lowercase();
                !self.skip_lines.iter().any(|pattern| pattern.is_match(&lower))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Collects rendered text below `root`, breaking lines at block elements
pub fn visible_text(root: ElementRef) -> String {
    let mut out = String::new();
    collect_text(root, &mut out);
    out
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(value) => {
                let name = value.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn compile_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidPattern(format!("selector '{}': {:?}", css, e)))
}

fn compile_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("regex '{}': {}", pattern, e)))
}
