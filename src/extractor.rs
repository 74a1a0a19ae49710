//! 结构片段提取模块
//!
//! 按固定优先级扫描Markdown文档，把代码块、行内代码、图片、链接、标题、
//! 粗体、斜体和列表项替换为占位符，并记录占位符到原文的映射。
//!
//! 每一类匹配器都作用于前一类替换后的文本，因此后提取的片段可能包含
//! 先提取片段的占位符（例如标题里的行内代码）。还原时按提取顺序的逆序
//! 替换即可得到原文。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

/// 所有占位符共享的前缀
pub const PLACEHOLDER_PREFIX: &str = "[PLACEHOLDER_";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?(?:```|\z)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]\n]*\]\([^)\n]+\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]\n]+\]\([^)\n]+\)").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t][^\n]*").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*\n]+\*\*").unwrap());
// 开闭星号两侧不能是空白，避免把 "* " 列表符号当成斜体起点
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*[^*\s](?:[^*\n]*[^*\s])?\*").unwrap());

/// 被保护的片段类型，声明顺序即提取优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    CodeBlock,
    InlineCode,
    Image,
    Link,
    Heading,
    Bold,
    Italic,
    ListItem,
}

impl SpanKind {
    /// 提取顺序
    pub const EXTRACTION_ORDER: [SpanKind; 8] = [
        SpanKind::CodeBlock,
        SpanKind::InlineCode,
        SpanKind::Image,
        SpanKind::Link,
        SpanKind::Heading,
        SpanKind::Bold,
        SpanKind::Italic,
        SpanKind::ListItem,
    ];

    /// 占位符中使用的类型名
    pub fn label(self) -> &'static str {
        match self {
            SpanKind::CodeBlock => "CODE",
            SpanKind::InlineCode => "INLINE_CODE",
            SpanKind::Image => "IMAGE",
            SpanKind::Link => "LINK",
            SpanKind::Heading => "HEADING",
            SpanKind::Bold => "BOLD",
            SpanKind::Italic => "ITALIC",
            SpanKind::ListItem => "LIST",
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        match self {
            SpanKind::CodeBlock => Some(&*CODE_FENCE),
            SpanKind::InlineCode => Some(&*INLINE_CODE),
            SpanKind::Image => Some(&*IMAGE),
            SpanKind::Link => Some(&*LINK),
            SpanKind::Heading => Some(&*HEADING),
            SpanKind::Bold => Some(&*BOLD),
            SpanKind::Italic => Some(&*ITALIC),
            SpanKind::ListItem => None,
        }
    }
}

/// 一个占位符及其替换掉的原文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    pub kind: SpanKind,
    pub original: String,
}

/// 占位符映射
///
/// 按提取顺序保存条目。映射只在单次 [`extract`] 调用内创建并返回，
/// 不会在多个请求之间共享。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<Placeholder>,
}

impl PlaceholderMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查找占位符对应的原文
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| entry.original.as_str())
    }

    /// 按提取顺序遍历
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Placeholder> {
        self.entries.iter()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.token.as_str())
    }

    /// 某一类型的占位符数量
    pub fn count_of(&self, kind: SpanKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    /// 在翻译结果中丢失的占位符
    ///
    /// 只检查出现在 `clean` 中的顶层占位符；嵌套在其他片段原文里的占位符
    /// 不会发送给翻译后端，回填时随外层片段一起恢复。
    pub fn missing_from<'a>(&'a self, clean: &str, translated: &str) -> Vec<&'a str> {
        self.tokens()
            .filter(|token| clean.contains(token) && !translated.contains(token))
            .collect()
    }

    fn push(&mut self, token: String, kind: SpanKind, original: String) {
        self.entries.push(Placeholder { token, kind, original });
    }
}

/// 占位符命名方案
///
/// 默认生成 `[PLACEHOLDER_<KIND>_<n>]`。如果文档本身已经包含占位符前缀，
/// 改用带内容哈希后缀的 `[PLACEHOLDER_<KIND>_<n>_<hash>]`，后缀长度逐步加长，
/// 直到文档中不存在任何以该后缀结尾的记号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenScheme {
    suffix: Option<String>,
}

impl TokenScheme {
    pub fn for_document(document: &str) -> Self {
        if !document.contains(PLACEHOLDER_PREFIX) {
            return Self { suffix: None };
        }

        let digest = hex::encode(Sha256::digest(document.as_bytes()));
        for len in [8, 16, 32, 64] {
            let candidate = &digest[..len];
            if !document.contains(&format!("_{}]", candidate)) {
                return Self { suffix: Some(candidate.to_string()) };
            }
        }

        // 所有前缀都已出现在文档中：使用完整摘要加文档长度
        Self { suffix: Some(format!("{}{}", digest, document.len())) }
    }

    pub fn is_hashed(&self) -> bool {
        self.suffix.is_some()
    }

    pub fn token(&self, kind: SpanKind, ordinal: usize) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}_{}_{}]", PLACEHOLDER_PREFIX, kind.label(), ordinal, suffix),
            None => format!("{}{}_{}]", PLACEHOLDER_PREFIX, kind.label(), ordinal),
        }
    }
}

/// 提取结构片段
///
/// 返回替换后的文本和占位符映射。空文档返回空文本和空映射；
/// 未闭合的代码块把剩余全部内容视为代码。
///
/// # 示例
///
/// ```rust
/// use textbook_translator::extractor::extract;
///
/// let (clean, map) = extract("Use `cargo` now");
/// assert_eq!(clean, "Use [PLACEHOLDER_INLINE_CODE_0] now");
/// assert_eq!(map.len(), 1);
/// ```
pub fn extract(document: &str) -> (String, PlaceholderMap) {
    let mut map = PlaceholderMap::default();
    if document.is_empty() {
        return (String::new(), map);
    }

    let scheme = TokenScheme::for_document(document);
    let mut text = document.to_string();

    for kind in SpanKind::EXTRACTION_ORDER {
        text = match kind.pattern() {
            Some(pattern) => replace_matches(&text, pattern, kind, &scheme, &mut map),
            None => replace_list_items(&text, &scheme, &mut map),
        };
    }

    log::debug!(
        "Extracted {} spans ({} code blocks, hashed tokens: {})",
        map.len(),
        map.count_of(SpanKind::CodeBlock),
        scheme.is_hashed()
    );

    (text, map)
}

fn replace_matches(
    text: &str,
    pattern: &Regex,
    kind: SpanKind,
    scheme: &TokenScheme,
    map: &mut PlaceholderMap,
) -> String {
    let mut ordinal = 0;
    pattern
        .replace_all(text, |caps: &Captures| {
            let token = scheme.token(kind, ordinal);
            ordinal += 1;
            map.push(token.clone(), kind, caps[0].to_string());
            token
        })
        .into_owned()
}

/// 列表项从项目符号行开始，向后吞并非空且不是新项目符号的行
fn replace_list_items(text: &str, scheme: &TokenScheme, map: &mut PlaceholderMap) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut ordinal = 0;
    let mut i = 0;

    while i < lines.len() {
        if !is_bullet_line(lines[i]) {
            output.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let start = i;
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() && !is_bullet_line(lines[i]) {
            i += 1;
        }

        let token = scheme.token(SpanKind::ListItem, ordinal);
        ordinal += 1;
        map.push(token.clone(), SpanKind::ListItem, lines[start..i].join("\n"));
        output.push(token);
    }

    output.join("\n")
}

fn is_bullet_line(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    matches!(chars.next(), Some('-' | '*' | '+' | '•'))
        && matches!(chars.next(), Some(' ' | '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restorer::restore_placeholders;

    #[test]
    fn test_scenario_four_placeholders() {
        let doc = "# Title\n\nSome **bold** text with `code` and a [link](http://x.com).";
        let (clean, map) = extract(doc);

        assert_eq!(map.len(), 4);
        assert_eq!(
            clean,
            "[PLACEHOLDER_HEADING_0]\n\nSome [PLACEHOLDER_BOLD_0] text with \
             [PLACEHOLDER_INLINE_CODE_0] and a [PLACEHOLDER_LINK_0]."
        );
        assert_eq!(map.get("[PLACEHOLDER_HEADING_0]"), Some("# Title"));
        assert_eq!(map.get("[PLACEHOLDER_BOLD_0]"), Some("**bold**"));
        assert_eq!(map.get("[PLACEHOLDER_INLINE_CODE_0]"), Some("`code`"));
        assert_eq!(map.get("[PLACEHOLDER_LINK_0]"), Some("[link](http://x.com)"));
        assert_eq!(restore_placeholders(&clean, &map), doc);
    }

    #[test]
    fn test_empty_document() {
        let (clean, map) = extract("");
        assert_eq!(clean, "");
        assert!(map.is_empty());
    }

    #[test]
    fn test_code_fence_extracted_before_everything_else() {
        let doc = "Intro\n```md\n**not bold** and [x](y) and `z`\n```\nOutro";
        let (clean, map) = extract(doc);

        assert_eq!(clean, "Intro\n[PLACEHOLDER_CODE_0]\nOutro");
        assert_eq!(map.len(), 1);
        assert_eq!(map.count_of(SpanKind::Bold), 0);
        assert_eq!(
            map.get("[PLACEHOLDER_CODE_0]"),
            Some("```md\n**not bold** and [x](y) and `z`\n```")
        );
    }

    #[test]
    fn test_unterminated_fence_swallows_rest() {
        let doc = "Text\n```python\nprint(1)\n";
        let (clean, map) = extract(doc);
        assert_eq!(clean, "Text\n[PLACEHOLDER_CODE_0]");
        assert_eq!(map.get("[PLACEHOLDER_CODE_0]"), Some("```python\nprint(1)\n"));
    }

    #[test]
    fn test_image_is_not_taken_for_link() {
        let (clean, map) = extract("See ![diagram](img.png) and [docs](d.html)");
        assert_eq!(clean, "See [PLACEHOLDER_IMAGE_0] and [PLACEHOLDER_LINK_0]");
        assert_eq!(map.get("[PLACEHOLDER_IMAGE_0]"), Some("![diagram](img.png)"));
    }

    #[test]
    fn test_bold_before_italic() {
        let (clean, map) = extract("A **strong** and *soft* word");
        assert_eq!(clean, "A [PLACEHOLDER_BOLD_0] and [PLACEHOLDER_ITALIC_0] word");
        assert_eq!(map.get("[PLACEHOLDER_ITALIC_0]"), Some("*soft*"));
    }

    #[test]
    fn test_repeated_spans_get_distinct_ordinals() {
        let (clean, map) = extract("`a` then `a` again");
        assert_eq!(clean, "[PLACEHOLDER_INLINE_CODE_0] then [PLACEHOLDER_INLINE_CODE_1] again");
        assert_eq!(map.get("[PLACEHOLDER_INLINE_CODE_1]"), Some("`a`"));
    }

    #[test]
    fn test_list_items_extend_until_blank_or_next_bullet() {
        let doc = "- first\n  continued\n* second\n\nAfter";
        let (clean, map) = extract(doc);
        assert_eq!(clean, "[PLACEHOLDER_LIST_0]\n[PLACEHOLDER_LIST_1]\n\nAfter");
        assert_eq!(map.get("[PLACEHOLDER_LIST_0]"), Some("- first\n  continued"));
        assert_eq!(map.get("[PLACEHOLDER_LIST_1]"), Some("* second"));
    }

    #[test]
    fn test_star_bullet_is_not_italic() {
        let (_, map) = extract("* item with *emphasis*");
        assert_eq!(map.count_of(SpanKind::Italic), 1);
        assert_eq!(map.get("[PLACEHOLDER_ITALIC_0]"), Some("*emphasis*"));
        assert_eq!(map.count_of(SpanKind::ListItem), 1);
    }

    #[test]
    fn test_nested_spans_restore_in_reverse_order() {
        let doc = "## Using `Vec` with [docs](https://doc.rust-lang.org)\n\n- **Bold** item";
        let (clean, map) = extract(doc);
        assert_eq!(clean, "[PLACEHOLDER_HEADING_0]\n\n[PLACEHOLDER_LIST_0]");
        assert_eq!(restore_placeholders(&clean, &map), doc);
    }

    #[test]
    fn test_tokens_are_unique() {
        let doc = "# A\n\n`x` `y` **b** *i* [l](u) ![i](u)\n\n- one\n- two\n```\ncode\n```";
        let (_, map) = extract(doc);
        let mut tokens: Vec<&str> = map.tokens().collect();
        let total = tokens.len();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), total);
        for a in map.tokens() {
            for b in map.tokens() {
                if a != b {
                    assert!(!b.contains(a), "{} is contained in {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_collision_switches_to_hashed_tokens() {
        let doc = "Literal [PLACEHOLDER_BOLD_0] and real **bold**";
        let scheme = TokenScheme::for_document(doc);
        assert!(scheme.is_hashed());

        let (clean, map) = extract(doc);
        let token = map.tokens().next().unwrap().to_string();
        assert_ne!(token, "[PLACEHOLDER_BOLD_0]");
        assert!(token.starts_with("[PLACEHOLDER_BOLD_0_"));
        assert!(clean.contains("Literal [PLACEHOLDER_BOLD_0] and real"));
        assert!(!doc.contains(&token));
        assert_eq!(restore_placeholders(&clean, &map), doc);
    }

    #[test]
    fn test_missing_tokens() {
        let (clean, map) = extract("**a** and `b`");
        let damaged = clean.replace("[PLACEHOLDER_BOLD_0]", "");
        assert_eq!(map.missing_from(&clean, &damaged), vec!["[PLACEHOLDER_BOLD_0]"]);
        assert!(map.missing_from(&clean, &clean).is_empty());
    }

    #[test]
    fn test_nested_tokens_are_not_reported_missing() {
        let (clean, map) = extract("## Using `Vec`\n\n- a **bold** item");
        assert_eq!(map.count_of(SpanKind::InlineCode), 1);
        assert_eq!(map.count_of(SpanKind::Bold), 1);
        assert!(!clean.contains("[PLACEHOLDER_INLINE_CODE_0]"));
        assert!(!clean.contains("[PLACEHOLDER_BOLD_0]"));

        let translated = format!("UR: {}", clean);
        assert!(map.missing_from(&clean, &translated).is_empty());

        let damaged = translated.replace("[PLACEHOLDER_HEADING_0]", "");
        assert_eq!(map.missing_from(&clean, &damaged), vec!["[PLACEHOLDER_HEADING_0]"]);
    }
}
