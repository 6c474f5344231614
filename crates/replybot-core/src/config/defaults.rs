//! Default value functions used by serde for config deserialization.

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_line_api_base() -> String {
    "https://api.line.me".to_string()
}

pub fn default_provider() -> String {
    "none".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

pub fn default_anthropic_max_tokens() -> u32 {
    1024
}

pub fn default_apology_message() -> String {
    "ขออภัยค่ะ ระบบขัดข้องชั่วคราว กรุณาลองใหม่อีกครั้ง".to_string()
}

pub fn default_alt_text() -> String {
    "มีข้อความใหม่".to_string()
}

pub fn default_completion_timeout() -> u64 {
    20
}

pub fn default_settings_path() -> String {
    "setting.json".to_string()
}

pub fn default_admin_page() -> String {
    "admin.html".to_string()
}

pub fn default_uploads_dir() -> String {
    "uploads".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
