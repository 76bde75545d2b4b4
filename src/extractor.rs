/// 提取两个标记之间的子串并去除首尾空白
///
/// 起始标记不存在，或结束标记没有出现在起始标记之后时返回空字符串，
/// 这是"未找到"的约定返回值，不是错误
pub fn extract_between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let Some(start_index) = text.find(start) else {
        return "";
    };
    let from = start_index + start.len();
    let Some(len) = text[from..].find(end) else {
        return "";
    };
    text[from..from + len].trim()
}
