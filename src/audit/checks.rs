//! Accessibility check battery
//!
//! A fixed, ordered set of independent DOM inspections run against the
//! serialized page markup. Each check is pure over the snapshot and
//! tolerates empty or malformed documents; the battery collects whatever
//! can be collected.

use crate::models::{AccessibilityIssue, Severity};
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};

/// Maximum characters kept from an offending element's markup
const MAX_SNIPPET_CHARS: usize = 200;

/// Fixed metadata for one rule in the battery
pub struct CheckRule {
    pub id: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub help: &'static str,
    pub help_url: &'static str,
}

const IMAGE_ALT: CheckRule = CheckRule {
    id: "image-alt",
    severity: Severity::Serious,
    description: "Image is missing a text alternative",
    help: "Give every <img> a non-empty alt attribute that describes the image.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/image-alt",
};

const LABEL: CheckRule = CheckRule {
    id: "label",
    severity: Severity::Critical,
    description: "Form input is missing an accessible label",
    help: "Associate a <label for=...> with the input, wrap it in a <label>, \
           or add aria-label/aria-labelledby.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/label",
};

const DOCUMENT_TITLE: CheckRule = CheckRule {
    id: "document-title",
    severity: Severity::Serious,
    description: "Document does not have a title",
    help: "Add a non-empty <title> element inside <head>.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/document-title",
};

const HTML_HAS_LANG: CheckRule = CheckRule {
    id: "html-has-lang",
    severity: Severity::Serious,
    description: "The <html> element is missing a lang attribute",
    help: "Set lang on the root element so assistive technology announces \
           the correct language.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/html-has-lang",
};

const PAGE_HAS_HEADING_ONE: CheckRule = CheckRule {
    id: "page-has-heading-one",
    severity: Severity::Moderate,
    description: "Page does not contain a level-one heading",
    help: "Add a single <h1> that describes the main content of the page.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/page-has-heading-one",
};

const SKIP_LINK: CheckRule = CheckRule {
    id: "skip-link",
    severity: Severity::Moderate,
    description: "Page has no skip link",
    help: "Provide an anchor at the top of the page that jumps to the main \
           content, e.g. <a href=\"#main\">Skip to main content</a>.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/skip-link",
};

const HEADING_ORDER: CheckRule = CheckRule {
    id: "heading-order",
    severity: Severity::Moderate,
    description: "Heading levels should only increase by one",
    help: "Restructure the headings so no level is skipped.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/heading-order",
};

const TABINDEX: CheckRule = CheckRule {
    id: "tabindex",
    severity: Severity::Minor,
    description: "Element has a positive tabindex",
    help: "Use tabindex=\"0\" or \"-1\" so focus order follows the document.",
    help_url: "https://dequeuniversity.com/rules/axe/4.8/tabindex",
};

/// The full battery, in execution order
pub const RULES: [&CheckRule; 8] = [
    &IMAGE_ALT,
    &LABEL,
    &DOCUMENT_TITLE,
    &HTML_HAS_LANG,
    &PAGE_HAS_HEADING_ONE,
    &SKIP_LINK,
    &HEADING_ORDER,
    &TABINDEX,
];

/// Runs every check against one DOM snapshot. Checks are independent;
/// a check that finds nothing simply contributes zero issues.
pub fn run_battery(html: &str) -> Vec<AccessibilityIssue> {
    let dom = Html::parse_document(html);
    let mut issues = Vec::new();
    issues.extend(check_image_alt(&dom));
    issues.extend(check_input_labels(&dom));
    issues.extend(check_document_title(&dom));
    issues.extend(check_html_lang(&dom));
    issues.extend(check_heading_one(&dom));
    issues.extend(check_skip_link(&dom));
    issues.extend(check_heading_order(&dom));
    issues.extend(check_tabindex(&dom));
    issues
}

fn check_image_alt(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(images) = Selector::parse("img") else {
        return Vec::new();
    };
    dom.select(&images)
        .enumerate()
        .filter(|(_, img)| {
            img.value()
                .attr("alt")
                .map_or(true, |alt| alt.trim().is_empty())
        })
        .map(|(i, img)| element_issue(&IMAGE_ALT, "img", i, img))
        .collect()
}

fn check_input_labels(dom: &Html) -> Vec<AccessibilityIssue> {
    let (Ok(inputs), Ok(labels)) = (Selector::parse("input"), Selector::parse("label")) else {
        return Vec::new();
    };

    let label_targets: HashSet<&str> = dom
        .select(&labels)
        .filter_map(|label| label.value().attr("for"))
        .collect();

    dom.select(&inputs)
        .enumerate()
        .filter(|(_, input)| {
            let kind = input
                .value()
                .attr("type")
                .unwrap_or("text")
                .to_ascii_lowercase();
            if matches!(kind.as_str(), "hidden" | "submit" | "button") {
                return false;
            }
            !is_labelled(input, &label_targets)
        })
        .map(|(i, input)| element_issue(&LABEL, "input", i, input))
        .collect()
}

fn is_labelled(input: &ElementRef<'_>, label_targets: &HashSet<&str>) -> bool {
    let element = input.value();
    if element
        .attr("aria-label")
        .is_some_and(|v| !v.trim().is_empty())
    {
        return true;
    }
    if element
        .attr("aria-labelledby")
        .is_some_and(|v| !v.trim().is_empty())
    {
        return true;
    }
    if element.attr("id").is_some_and(|id| label_targets.contains(id)) {
        return true;
    }
    // A wrapping <label> also counts
    input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "label")
}

fn check_document_title(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(title) = Selector::parse("title") else {
        return Vec::new();
    };
    let has_title = dom
        .select(&title)
        .next()
        .is_some_and(|t| !t.text().collect::<String>().trim().is_empty());
    if has_title {
        Vec::new()
    } else {
        vec![page_issue(&DOCUMENT_TITLE)]
    }
}

fn check_html_lang(dom: &Html) -> Vec<AccessibilityIssue> {
    let root = dom.root_element();
    let has_lang = root
        .value()
        .attr("lang")
        .is_some_and(|lang| !lang.trim().is_empty());
    if has_lang {
        Vec::new()
    } else {
        vec![element_issue(&HTML_HAS_LANG, "html", 0, root)]
    }
}

fn check_heading_one(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(h1) = Selector::parse("h1") else {
        return Vec::new();
    };
    if dom.select(&h1).next().is_some() {
        Vec::new()
    } else {
        vec![page_issue(&PAGE_HAS_HEADING_ONE)]
    }
}

fn check_skip_link(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(anchors) = Selector::parse(r##"a[href^="#"]"##) else {
        return Vec::new();
    };
    let has_skip_link = dom.select(&anchors).any(|anchor| {
        let text = anchor.text().collect::<String>().to_lowercase();
        text.contains("skip") || text.contains("main")
    });
    if has_skip_link {
        Vec::new()
    } else {
        vec![page_issue(&SKIP_LINK)]
    }
}

fn check_heading_order(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(headings) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    let mut previous: Option<u8> = None;
    let mut ordinals: HashMap<String, usize> = HashMap::new();

    for heading in dom.select(&headings) {
        let name = heading.value().name().to_string();
        let Some(level) = name.strip_prefix('h').and_then(|n| n.parse::<u8>().ok()) else {
            continue;
        };
        let ordinal = *ordinals
            .entry(name.clone())
            .and_modify(|n| *n += 1)
            .or_insert(0);
        if let Some(prev) = previous {
            if level > prev + 1 {
                issues.push(element_issue(&HEADING_ORDER, &name, ordinal, heading));
            }
        }
        previous = Some(level);
    }
    issues
}

fn check_tabindex(dom: &Html) -> Vec<AccessibilityIssue> {
    let Ok(tabbed) = Selector::parse("[tabindex]") else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    let mut ordinals: HashMap<String, usize> = HashMap::new();

    for element in dom.select(&tabbed) {
        let name = element.value().name().to_string();
        let ordinal = *ordinals
            .entry(name.clone())
            .and_modify(|n| *n += 1)
            .or_insert(0);
        let positive = element
            .value()
            .attr("tabindex")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .is_some_and(|v| v > 0);
        if positive {
            issues.push(element_issue(&TABINDEX, &name, ordinal, element));
        }
    }
    issues
}

/// Builds an issue anchored to a specific element. `ordinal` is zero-based.
fn element_issue(
    rule: &CheckRule,
    tag: &str,
    ordinal: usize,
    element: ElementRef<'_>,
) -> AccessibilityIssue {
    AccessibilityIssue {
        rule_id: rule.id.to_string(),
        severity: rule.severity,
        description: rule.description.to_string(),
        help: Some(rule.help.to_string()),
        help_url: Some(rule.help_url.to_string()),
        selector: Some(format!("{tag}:nth-of-type({})", ordinal + 1)),
        html_snippet: Some(truncate_snippet(&element.html())),
    }
}

/// Builds a page-level issue with no element anchor
fn page_issue(rule: &CheckRule) -> AccessibilityIssue {
    AccessibilityIssue {
        rule_id: rule.id.to_string(),
        severity: rule.severity,
        description: rule.description.to_string(),
        help: Some(rule.help.to_string()),
        help_url: Some(rule.help_url.to_string()),
        selector: None,
        html_snippet: None,
    }
}

fn truncate_snippet(html: &str) -> String {
    html.chars().take(MAX_SNIPPET_CHARS).collect()
}
