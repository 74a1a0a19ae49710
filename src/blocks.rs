//! Markdown分块模块
//!
//! 单遍逐行扫描，把文档切分为有类型的块，供按块翻译使用。
//! 每个块记录内容前后的原始文本（缩进、`#`、列表符号、行尾空白），
//! 内容未被修改时渲染结果与原文逐字节相同。

/// 代码围栏分隔符
pub const CODE_FENCE: &str = "```";

/// 块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// 标题，`level` 为行首 `#` 的数量
    Heading { level: usize },
    /// 围栏代码块，内容包含两端分隔符
    Code,
    /// 列表项，内容为项目符号之后的文本
    ListItem,
    /// 整行被强调符号包裹的行，例如 `**Note**`
    Formatted,
    /// 普通段落行
    Paragraph,
    /// 空行
    Empty,
}

impl BlockKind {
    /// 是否需要翻译
    pub fn is_translatable(self) -> bool {
        matches!(
            self,
            BlockKind::Heading { .. } | BlockKind::ListItem | BlockKind::Paragraph
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Code => "code",
            BlockKind::ListItem => "list_item",
            BlockKind::Formatted => "formatted",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Empty => "empty",
        }
    }
}

/// 文档中的一个块
///
/// `content` 是翻译时唯一会被修改的字段；`original` 保存原始行，
/// `marker` 和 `trailing` 是内容前后的原始文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub content: String,
    pub original: String,
    marker: String,
    trailing: String,
}

impl Block {
    fn verbatim(kind: BlockKind, original: String) -> Self {
        Self {
            kind,
            content: original.clone(),
            original,
            marker: String::new(),
            trailing: String::new(),
        }
    }

    fn empty(line: &str) -> Self {
        Self {
            kind: BlockKind::Empty,
            content: String::new(),
            original: line.to_string(),
            marker: line.to_string(),
            trailing: String::new(),
        }
    }

    /// 按行切分为 前缀 / 内容 / 行尾空白，`prefix_len` 之后的空白计入前缀
    fn split_line(kind: BlockKind, line: &str, prefix_len: usize) -> Self {
        let body = &line[prefix_len..];
        let content_start = prefix_len + (body.len() - body.trim_start().len());
        let content_end = line.trim_end().len().max(content_start);

        Self {
            kind,
            content: line[content_start..content_end].to_string(),
            original: line.to_string(),
            marker: line[..content_start].to_string(),
            trailing: line[content_end..].to_string(),
        }
    }

    /// 内容前的标记文本，例如 `"## "` 或 `"- "`
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// 渲染回Markdown文本
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.marker.len() + self.content.len() + self.trailing.len());
        out.push_str(&self.marker);
        out.push_str(&self.content);
        out.push_str(&self.trailing);
        out
    }
}

/// 把文档解析为有序的块序列
///
/// 未闭合的代码围栏会吞并到文档末尾的所有行，且不会补全闭合分隔符。
///
/// # 示例
///
/// ```rust
/// use textbook_translator::blocks::{parse, BlockKind};
///
/// let blocks = parse("# Title\n\nHello");
/// assert_eq!(blocks[0].kind, BlockKind::Heading { level: 1 });
/// assert_eq!(blocks[0].content, "Title");
/// assert_eq!(blocks[1].kind, BlockKind::Empty);
/// assert_eq!(blocks[2].kind, BlockKind::Paragraph);
/// ```
pub fn parse(document: &str) -> Vec<Block> {
    let lines: Vec<&str> = document.split('\n').collect();
    let mut blocks = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if trimmed.is_empty() {
            blocks.push(Block::empty(line));
            i += 1;
            continue;
        }

        if trimmed.starts_with('#') {
            let level = trimmed.len() - trimmed.trim_start_matches('#').len();
            blocks.push(Block::split_line(BlockKind::Heading { level }, line, indent + level));
            i += 1;
            continue;
        }

        if trimmed.starts_with(CODE_FENCE) {
            let start = i;
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with(CODE_FENCE) {
                i += 1;
            }
            // 闭合分隔符属于当前块
            let end = if i < lines.len() { i + 1 } else { i };
            blocks.push(Block::verbatim(BlockKind::Code, lines[start..end].join("\n")));
            i = end;
            continue;
        }

        if let Some(bullet_len) = list_marker_len(trimmed) {
            blocks.push(Block::split_line(BlockKind::ListItem, line, indent + bullet_len));
        } else if is_formatted_line(trimmed) {
            blocks.push(Block::verbatim(BlockKind::Formatted, line.to_string()));
        } else {
            blocks.push(Block::split_line(BlockKind::Paragraph, line, indent));
        }
        i += 1;
    }

    log::debug!("Parsed {} blocks from {} lines", blocks.len(), lines.len());
    blocks
}

/// 列表符号长度：`- ` `* ` `+ ` 或 `<数字>. `，不含其后的空格
fn list_marker_len(trimmed: &str) -> Option<usize> {
    if ["- ", "* ", "+ "].iter().any(|bullet| trimmed.starts_with(bullet)) {
        return Some(1);
    }

    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && trimmed[digits..].starts_with(". ") {
        return Some(digits + 1);
    }

    None
}

fn is_formatted_line(trimmed: &str) -> bool {
    trimmed.len() >= 2 && trimmed.starts_with('*') && trimmed.ends_with('*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restorer::reconstruct;

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|block| block.kind).collect()
    }

    #[test]
    fn test_parse_mixed_document() {
        let doc = "# Intro\n\nFirst line.\n- item one\n2. second\n**Note**\n```rust\nlet x = 1;\n```";
        let blocks = parse(doc);

        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Heading { level: 1 },
                BlockKind::Empty,
                BlockKind::Paragraph,
                BlockKind::ListItem,
                BlockKind::ListItem,
                BlockKind::Formatted,
                BlockKind::Code,
            ]
        );
        assert_eq!(blocks[3].content, "item one");
        assert_eq!(blocks[3].marker(), "- ");
        assert_eq!(blocks[4].content, "second");
        assert_eq!(blocks[4].marker(), "2. ");
        assert_eq!(blocks[6].content, "```rust\nlet x = 1;\n```");
    }

    #[test]
    fn test_heading_levels() {
        let blocks = parse("### Deep\n#Tight");
        assert_eq!(blocks[0].kind, BlockKind::Heading { level: 3 });
        assert_eq!(blocks[0].content, "Deep");
        assert_eq!(blocks[1].kind, BlockKind::Heading { level: 1 });
        assert_eq!(blocks[1].content, "Tight");
        assert_eq!(blocks[1].marker(), "#");
    }

    #[test]
    fn test_unterminated_fence_consumes_rest() {
        let blocks = parse("```python\nprint(1)\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Code);
        assert_eq!(blocks[0].content, "```python\nprint(1)\n");
    }

    #[test]
    fn test_code_block_keeps_markdown_like_lines() {
        let doc = "```\n# not a heading\n- not a list\n**bold**\n```\nafter";
        let blocks = parse(doc);
        assert_eq!(kinds(&blocks), vec![BlockKind::Code, BlockKind::Paragraph]);
        assert_eq!(blocks[0].content, "```\n# not a heading\n- not a list\n**bold**\n```");
    }

    #[test]
    fn test_paragraph_content_is_trimmed() {
        let blocks = parse("   indented text  ");
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].content, "indented text");
        assert_eq!(blocks[0].render(), "   indented text  ");
    }

    #[test]
    fn test_empty_document_is_single_empty_block() {
        let blocks = parse("");
        assert_eq!(kinds(&blocks), vec![BlockKind::Empty]);
        assert_eq!(reconstruct(&blocks), "");
    }

    #[test]
    fn test_translated_heading_renders_with_marker() {
        let mut blocks = parse("## Title");
        blocks[0].content = "عنوان".to_string();
        assert_eq!(blocks[0].render(), "## عنوان");
    }

    #[test]
    fn test_translatable_kinds() {
        assert!(BlockKind::Heading { level: 2 }.is_translatable());
        assert!(BlockKind::Paragraph.is_translatable());
        assert!(BlockKind::ListItem.is_translatable());
        assert!(!BlockKind::Code.is_translatable());
        assert!(!BlockKind::Empty.is_translatable());
        assert!(!BlockKind::Formatted.is_translatable());
    }
}
