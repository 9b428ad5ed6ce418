//! Centralized constants
//!
//! Defaults shared between `settings.rs` and component-level config structs
//! so the two never drift apart.

/// Retrieval defaults
pub mod rag {
    /// Final number of chunks returned by hybrid retrieval
    pub const DEFAULT_TOP_K: usize = 5;
    /// Candidates fetched from each backend before merging
    pub const DEFAULT_CANDIDATE_K: usize = 20;
    /// Weight of the dense score in the weighted-sum merge
    pub const DENSE_WEIGHT: f32 = 0.7;
    /// Penalty applied to chunks found by only one backend
    pub const SINGLE_SOURCE_PENALTY: f32 = 0.7;
}

/// Gate and normalizer defaults
pub mod gate {
    /// Below this confidence a classifier verdict is treated as unusable
    pub const MIN_CLASSIFIER_CONFIDENCE: f32 = 0.5;
    /// Tone-mark density below which Vietnamese text is considered unmarked
    pub const TONE_DENSITY_THRESHOLD: f32 = 0.05;
    /// Language-identification confidence floor
    pub const MIN_LANGUAGE_CONFIDENCE: f32 = 0.5;
}

/// Conversation defaults
pub mod conversation {
    /// Token budget for the history window handed to generation
    pub const DEFAULT_HISTORY_TOKEN_BUDGET: usize = 1500;
}

/// Agent defaults
pub mod agent {
    /// Maximum reasoning-loop iterations before the degraded fallback
    pub const MAX_ITERATIONS: usize = 5;
}

/// Suggestion search defaults
pub mod suggestions {
    /// Number of follow-up questions returned
    pub const DEFAULT_TOP_N: usize = 3;
    /// Cosine similarity floor
    pub const SIMILARITY_FLOOR: f32 = 0.55;
    /// Lookup timeout in milliseconds; the answer is never delayed past this
    pub const TIMEOUT_MS: u64 = 500;
}

/// Default service endpoints
pub mod endpoints {
    pub const QDRANT_DEFAULT: &str = "http://localhost:6334";
    pub const MODEL_GATEWAY_DEFAULT: &str = "http://localhost:8000";
    pub const LLM_DEFAULT: &str = "http://localhost:11434";
    pub const EMBED_DEFAULT: &str = "https://api.openai.com";
}

/// Fixed user-facing responses for terminal gate verdicts
pub mod responses {
    /// Refusal shown when prompt injection is flagged
    pub const INJECTION_REFUSAL: &str =
        "Xin lỗi, mình không thể xử lý yêu cầu này. Bạn vui lòng đặt câu hỏi khác về \
         tuyển sinh và đào tạo tại UIT nhé.";

    /// Reply for off-domain questions
    pub const OUT_OF_SCOPE: &str =
        "Mình chỉ hỗ trợ các câu hỏi về tuyển sinh và đào tạo tại Trường Đại học \
         Công nghệ Thông tin (UIT). Bạn vui lòng đặt câu hỏi trong phạm vi này nhé.";

    /// Apology returned when generation fails after the retry budget
    pub const GENERATION_APOLOGY: &str =
        "Xin lỗi, hệ thống đang gặp sự cố khi tạo câu trả lời. Bạn vui lòng thử lại \
         sau ít phút nhé.";

    /// Degraded answer when the agent exhausts its iterations
    pub const AGENT_INSUFFICIENT: &str =
        "Xin lỗi, mình chưa đủ thông tin để trả lời chính xác câu hỏi này. Bạn có thể \
         cung cấp thêm điểm số, tổ hợp môn và năm xét tuyển được không?";
}
