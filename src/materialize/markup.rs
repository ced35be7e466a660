//! Rendering Gherkin text into Jira wiki markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DescriptionFormat;

/// Keywords bolded at the start of a line, longest-first where they overlap.
pub const KEYWORDS: [&str; 8] = [
    "Feature:",
    "Scenario Outline:",
    "Scenario:",
    "Given",
    "When",
    "Then",
    "And",
    "But",
];

const CODE_OPEN: &str = "{code:language=gherkin}\n";
const CODE_CLOSE: &str = "\n{code}";

fn keyword_patterns(template: &str) -> Vec<Regex> {
    KEYWORDS
        .iter()
        .map(|k| {
            Regex::new(&template.replace("KW", &regex::escape(k))).expect("valid keyword regex")
        })
        .collect()
}

static BOLD: LazyLock<Vec<Regex>> = LazyLock::new(|| keyword_patterns(r"(?m)^(\s*)(KW)"));

static UNBOLD: LazyLock<Vec<Regex>> =
    LazyLock::new(|| keyword_patterns(r"(?m)^(\s*)\*(KW)\* "));

/// A line already starting with `*Keyword*`, behind any number of backslashes.
static ESCAPE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| keyword_patterns(r"(?m)^(\s*)(\\*)\*(KW)\*"));

static UNESCAPE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| keyword_patterns(r"(?m)^(\s*)\\(\\*)\*(KW)\*"));

/// Wrap each line-leading keyword in `*...*` followed by one space.
///
/// One find/replace per keyword; a keyword is matched as a plain prefix, so
/// "Android" becomes "*And* roid". The number of lines never changes. A line
/// that already starts with `*Keyword*` gets one more leading backslash, which
/// Jira renders as a literal star and [`strip_markup`] removes again.
pub fn bold_keywords(content: &str) -> String {
    let escaped = ESCAPE.iter().fold(content.to_string(), |text, re| {
        re.replace_all(&text, r"${1}\${2}*${3}*").into_owned()
    });
    BOLD.iter().fold(escaped, |text, re| {
        re.replace_all(&text, "${1}*${2}* ").into_owned()
    })
}

/// Render node content for the description field.
pub fn format_description(content: &str, format: DescriptionFormat) -> String {
    match format {
        DescriptionFormat::Markup => bold_keywords(content),
        DescriptionFormat::CodeBlock => format!("{}{}{}", CODE_OPEN, content, CODE_CLOSE),
    }
}

/// Undo [`format_description`] for either format.
pub fn strip_markup(description: &str) -> String {
    if let Some(inner) = description
        .strip_prefix(CODE_OPEN)
        .and_then(|rest| rest.strip_suffix(CODE_CLOSE))
    {
        return inner.to_string();
    }
    let unbolded = UNBOLD.iter().fold(description.to_string(), |text, re| {
        re.replace_all(&text, "${1}${2}").into_owned()
    });
    UNESCAPE.iter().fold(unbolded, |text, re| {
        re.replace_all(&text, "${1}${2}*${3}*").into_owned()
    })
}
