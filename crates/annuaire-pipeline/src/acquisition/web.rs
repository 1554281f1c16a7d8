//! Visible text of a static HTML page

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

/// Elements whose content never reaches the page text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tr",
    "ul",
];

/// Elements that expand other elements when clicked
const TOGGLE_TRIGGERS: &str =
    "button, .toggle, [data-toggle], [data-bs-toggle], [aria-controls], [data-target]";

/// Render the visible text of an HTML page, one block per line
///
/// Content that the page only shows after user interaction (closed
/// `<details>`, `hidden` elements, collapsed blocks, toggle targets) is
/// included too, up to `max_reveal` concealed elements. Elements targeted by
/// a toggle on the page are revealed first; the rest in document order.
/// Problems in this step are logged and skipped.
pub fn page_text(html: &str, max_reveal: usize) -> String {
    let document = Html::parse_document(html);

    let mut walker = PageWalker {
        revealed: Vec::new(),
        budget: max_reveal,
        limit_hit: false,
        out: String::new(),
    };
    walker.reveal_toggle_targets(&document);

    match Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        Some(body) => walker.walk(body),
        None => walker.walk(document.root_element()),
    }

    if walker.limit_hit {
        warn!(
            max_reveal,
            "Reveal limit reached, some concealed page content was left out"
        );
    }
    debug!(revealed = walker.revealed.len(), "page rendered to text");

    tidy(&walker.out)
}

struct PageWalker<'a> {
    revealed: Vec<ElementRef<'a>>,
    budget: usize,
    limit_hit: bool,
    out: String,
}

impl<'a> PageWalker<'a> {
    /// Mark the targets of toggle buttons as revealed
    fn reveal_toggle_targets(&mut self, document: &'a Html) {
        let Ok(triggers) = Selector::parse(TOGGLE_TRIGGERS) else {
            return;
        };

        for trigger in document.select(&triggers) {
            let Some(target) = toggle_target(trigger) else {
                continue;
            };
            let Ok(selector) = Selector::parse(&target) else {
                warn!("Skipping toggle with unusable target '{}'", target);
                continue;
            };
            let Some(element) = document.select(&selector).next() else {
                warn!("Toggle target '{}' not found on page", target);
                continue;
            };
            if is_concealed(element) && !self.revealed.contains(&element) {
                self.try_reveal(element);
            }
        }
    }

    fn try_reveal(&mut self, element: ElementRef<'a>) -> bool {
        if self.budget == 0 {
            self.limit_hit = true;
            return false;
        }
        self.budget -= 1;
        self.revealed.push(element);
        true
    }

    fn walk(&mut self, element: ElementRef<'a>) {
        let tag = element.value().name();
        if SKIPPED_TAGS.contains(&tag) {
            return;
        }

        if is_concealed(element) && !self.revealed.contains(&element) && !self.try_reveal(element)
        {
            // A closed <details> still shows its summary
            if tag == "details" {
                for child in element.children().filter_map(ElementRef::wrap) {
                    if child.value().name() == "summary" {
                        self.walk(child);
                    }
                }
            }
            return;
        }

        let block = BLOCK_TAGS.contains(&tag);
        if block {
            self.out.push('\n');
        }
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.walk(child_element);
            } else if let Node::Text(text) = child.value() {
                self.out.push_str(text);
            }
        }
        match tag {
            "td" | "th" => self.out.push('\t'),
            _ if block => self.out.push('\n'),
            _ => {}
        }
    }
}

/// CSS selector of the element a toggle expands, if it names one
fn toggle_target(trigger: ElementRef<'_>) -> Option<String> {
    let el = trigger.value();
    if let Some(target) = el.attr("data-target").or_else(|| el.attr("data-bs-target")) {
        return Some(target.trim().to_string()).filter(|t| !t.is_empty());
    }
    if let Some(ids) = el.attr("aria-controls") {
        return ids.split_whitespace().next().map(|id| format!("#{}", id));
    }
    el.attr("href")
        .filter(|href| href.len() > 1 && href.starts_with('#'))
        .map(str::to_string)
}

/// Whether a browser would keep the element out of view until interaction
fn is_concealed(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if el.attr("hidden").is_some() || el.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(style) = el.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    if el.has_class("collapse", scraper::CaseSensitivity::AsciiCaseInsensitive)
        && !el.has_class("show", scraper::CaseSensitivity::AsciiCaseInsensitive)
    {
        return true;
    }
    el.name() == "details" && el.attr("open").is_none()
}

/// Collapse runs of spaces and drop blank lines
fn tidy(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_and_skipped_content() {
        let html = r#"<html><head><title>T</title><style>p { color: red }</style></head>
            <body><h1>Partenaires</h1><script>var x = 1;</script>
            <p>Jean   Dupont</p><ul><li>Lausanne</li><li>Genève</li></ul>
            <noscript>Enable JS</noscript></body></html>"#;
        assert_eq!(page_text(html, 10), "Partenaires\nJean Dupont\nLausanne\nGenève");
    }

    #[test]
    fn test_closed_details_are_revealed() {
        let html = "<body><details><summary>Contact</summary><p>021 555 00 00</p></details></body>";
        assert_eq!(page_text(html, 5), "Contact\n021 555 00 00");
    }

    #[test]
    fn test_zero_budget_keeps_summary_only() {
        let html = "<body><details><summary>Contact</summary><p>021 555 00 00</p></details>\
                    <div hidden>secret</div><p>visible</p></body>";
        assert_eq!(page_text(html, 0), "Contact\nvisible");
    }

    #[test]
    fn test_toggle_targets_take_priority() {
        let html = r##"<body>
            <div class="collapse" id="first">first hidden</div>
            <div style="display: none" id="second">second hidden</div>
            <button data-target="#second">More</button>
            </body>"##;
        let text = page_text(html, 1);
        assert!(text.contains("second hidden"));
        assert!(!text.contains("first hidden"));
        assert!(text.contains("More"));
    }

    #[test]
    fn test_aria_controls_and_anchor_targets() {
        let html = r##"<body>
            <a class="toggle" href="#horaires">Horaires</a>
            <div id="horaires" hidden>Lu-Ve 8h-17h</div>
            <button aria-controls="adresse">Adresse</button>
            <div id="adresse" class="collapse">Rue du Bugnon 46</div>
            </body>"##;
        let text = page_text(html, 2);
        assert!(text.contains("Lu-Ve 8h-17h"));
        assert!(text.contains("Rue du Bugnon 46"));
    }

    #[test]
    fn test_broken_toggle_targets_are_skipped() {
        let html = r##"<body>
            <button data-target="#!!bad">Broken</button>
            <button data-target="#missing">Missing</button>
            <p>Still here</p>
            </body>"##;
        let text = page_text(html, 3);
        assert!(text.contains("Still here"));
    }

    #[test]
    fn test_shown_collapse_is_plain_content() {
        let html = r#"<body><div class="collapse show">open block</div></body>"#;
        assert_eq!(page_text(html, 0), "open block");
    }

    #[test]
    fn test_table_cells_share_a_line() {
        let html = "<body><table><tr><td>Dupont</td><td>Jean</td></tr></table></body>";
        assert_eq!(page_text(html, 0), "Dupont Jean");
    }

    #[test]
    fn test_empty_page() {
        assert_eq!(page_text("<html><body><script>1</script></body></html>", 5), "");
    }
}
