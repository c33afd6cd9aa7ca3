//! Google models

use super::define_model;
use crate::model::Vendor;

define_model!(
    /// Gemini 2.0 Flash - fast multimodal model from Google
    Gemini2Flash {
        display_name: "Gemini 2.0 Flash",
        api_id: "gemini-2.0-flash-001",
        vendor: Vendor::Google,
        context_tokens: 1_048_576,
        output_tokens: 8_192
    }
);
