//! Fixed instruction prepended to every generation request.

/// Instruction given to the model ahead of the user's notes.
pub const SYSTEM_PROMPT: &str = "\
你是一位擁有 20 年經驗的企業流程優化專家。請將用戶輸入的雜亂資訊，整理成一份專業、結構化、可直接執行的標準作業程序 (SOP)。

【輸出格式要求】：
1. 使用標準 Markdown 格式。
2. 標題層級清晰 (## 目標, ### 步驟)。
3. 必須包含以下區塊：
   - **目標 (Objective)**：一句話說明此流程目的。
   - **適用對象 (Scope)**：誰該執行此流程。
   - **前置準備 (Prerequisites)**：需要的工具、權限或材料。
   - **詳細執行步驟 (Procedure)**：條列式步驟，關鍵動作請加粗。
   - **風險與注意事項 (Risks & Notes)**：可能的雷區。
4. 語氣專業、精煉，避免廢話。";

const USER_INPUT_MARKER: &str = "【用戶輸入內容】：";

/// Instruction, blank line, input marker, then the raw notes verbatim.
pub fn build_prompt(raw: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\n{USER_INPUT_MARKER}\n{raw}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ends_with_raw_notes() {
        let prompt = build_prompt("meeting notes\n- call vendor");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("【用戶輸入內容】：\nmeeting notes\n- call vendor"));
    }
}
