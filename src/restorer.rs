//! 格式还原模块
//!
//! 两种互为对偶的还原方式：
//!
//! - 占位符回填：把翻译结果中的占位符替换回原始Markdown片段
//! - 块重建：按原顺序渲染块序列并用换行连接

use crate::blocks::Block;
use crate::extractor::PlaceholderMap;

/// 把占位符替换回原文
///
/// 按提取顺序的逆序替换，嵌套在后提取片段中的占位符会在随后被展开。
/// 翻译结果中不存在的占位符直接跳过。
///
/// # 示例
///
/// ```rust
/// use textbook_translator::extractor::extract;
/// use textbook_translator::restorer::restore_placeholders;
///
/// let (clean, map) = extract("Run `make` first");
/// let translated = clean.replace("Run", "چلائیں").replace("first", "پہلے");
/// assert_eq!(restore_placeholders(&translated, &map), "چلائیں `make` پہلے");
/// ```
pub fn restore_placeholders(translated: &str, map: &PlaceholderMap) -> String {
    map.iter().rev().fold(translated.to_string(), |text, entry| {
        if text.contains(&entry.token) {
            text.replace(&entry.token, &entry.original)
        } else {
            text
        }
    })
}

/// 按原顺序重建文档
pub fn reconstruct(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::render)
        .collect::<Vec<_>>()
        .join("\n")
}
