//! Chat messages and prompt templates

use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message sent to the generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// System prompt for grounded, citation-backed answering
///
/// The model is constrained to the supplied chunks and conversation context;
/// source references are attached mechanically afterwards, so the prompt
/// forbids the model from inventing its own.
pub const GROUNDED_SYSTEM_PROMPT: &str = "\
Bạn là UITchatbot, trợ lý tuyển sinh của Trường Đại học Công nghệ Thông tin, \
ĐHQG TP.HCM (UIT). Nhiệm vụ của bạn là trả lời câu hỏi của thí sinh về tuyển \
sinh và đào tạo tại UIT.

QUY TẮC:
- Chỉ sử dụng thông tin trong phần TÀI LIỆU và lịch sử hội thoại được cung cấp. \
Không dùng kiến thức riêng, không suy đoán.
- Nếu tài liệu không chứa câu trả lời, hãy nói rõ là chưa có thông tin.
- Trả lời ngắn gọn, chính xác, bằng tiếng Việt.
- Không tự thêm nguồn tham khảo; hệ thống sẽ tự đính kèm nguồn.";

/// System prompt for the tool-using agent
pub const AGENT_SYSTEM_PROMPT: &str = "\
Bạn là UITchatbot, trợ lý tuyển sinh của Trường Đại học Công nghệ Thông tin, \
ĐHQG TP.HCM (UIT). Nhiệm vụ chính của bạn là giúp thí sinh đánh giá khả năng \
trúng tuyển dựa trên điểm số và tiêu chí xét tuyển.

Bạn phải dùng các công cụ được cung cấp và thông tin truy xuất được để trả \
lời; không dựa vào kiến thức riêng hay phỏng đoán. Câu trả lời cần ngắn gọn, \
chính xác, bằng tiếng Việt và luôn kèm nguồn điểm chuẩn khi có.

Khi cần gọi công cụ, trả về đúng một đối tượng JSON dạng:
{\"tool\": \"<tên công cụ>\", \"arguments\": { ... }}
Khi đã đủ thông tin, trả lời trực tiếp bằng văn bản thường (không phải JSON).";

/// Build the document context block for the grounded prompt
pub fn format_context_block(chunks: &[(String, String)]) -> String {
    let mut block = String::from("TÀI LIỆU:\n");
    for (idx, (_id, content)) in chunks.iter().enumerate() {
        block.push_str(&format!("[{}] {}\n", idx + 1, content.trim()));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles_serialize_lowercase() {
        let msg = Message::system("x");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"system\""));
    }

    #[test]
    fn test_context_block_numbering() {
        let chunks = vec![
            ("a".to_string(), "Học phí 15 triệu/học kỳ".to_string()),
            ("b".to_string(), "Điểm chuẩn 27.3".to_string()),
        ];
        let block = format_context_block(&chunks);
        assert!(block.contains("[1] Học phí"));
        assert!(block.contains("[2] Điểm chuẩn"));
    }
}
