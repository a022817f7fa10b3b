//! Chat prompt templates for OCR cleanup, document summaries, and answers.

use refqa_llm::Message;

/// A system/human message pair with `{name}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub human: &'static str,
}

impl PromptTemplate {
    /// Fill both messages. Placeholders without a value are left as written,
    /// and substituted values are never expanded again.
    #[must_use]
    pub fn render(&self, vars: &[(&str, &str)]) -> Vec<Message> {
        vec![
            Message::system(fill(self.system, vars)),
            Message::user(fill(self.human, vars)),
        ]
    }
}

fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub const OCR_CLEANUP: PromptTemplate = PromptTemplate {
    system: "你是一個專門整理銀行文件的助理，負責把 PDF 圖片經 OCR 辨識後的文字整理成結構清楚的段落，\
供後續的檢索增強生成（RAG）使用。請遵守以下規則：\
1. 只根據收到的 OCR 內容整理，不增加也不刪減任何資訊。\
2. 只在格式錯亂或有錯字時調整，內容必須忠於 OCR 結果。\
3. 數字、日期、貨幣符號必須與 OCR 結果完全一致，不得修改。\
請輸出格式一致、不需再清理的文字。",
    human: "OCR內容:{input}",
};

pub const DOCUMENT_SUMMARY: PromptTemplate = PromptTemplate {
    system: "你是一個專門為銀行處理文件的助理，負責把收到的文件精簡成約 500 字的摘要，並保留文件中的關鍵字。請嚴格遵守以下規則：\
1. 只根據提供的文件內容摘要，不得添加或推測任何資訊。\
2. 摘要的意思必須與原文一致，不得扭曲或省略重要細節。\
3. 保留並突顯專有名詞、公司名稱、數字、日期、貨幣符號等關鍵字，讓摘要容易被檢索。\
4. 數字、日期、貨幣符號必須與原文完全一致，不得更改。\
5. 語氣專業清楚，格式統一、結構分明。\
摘要將用於後續的檢索增強生成（RAG）流程。",
    human: "文檔內容:{input}",
};

pub const ANSWER: PromptTemplate = PromptTemplate {
    system: "你是一個為銀行客戶提供精確回答的助理，透過檢索增強生成（RAG）回應客戶的提問。\
請只根據以下內容回覆客戶問題：\n\n{rag_content}\n\n請遵守以下規則：\
1. 嚴格依據提供的內容回答，不添加或推測額外資訊。\
2. 數字、日期、貨幣符號等細節必須保持一致，不得修改。\
3. 回答需簡潔清楚，確保資訊正確。",
    human: "客戶問題: {input}",
};
