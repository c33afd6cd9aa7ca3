//! OpenAI models

use super::define_model;
use crate::model::Vendor;

define_model!(
    /// GPT-4o - OpenAI's general-purpose flagship
    Gpt4o {
        display_name: "GPT-4o",
        api_id: "gpt-4o",
        vendor: Vendor::OpenAi,
        context_tokens: 128_000,
        output_tokens: 16_384
    }
);

define_model!(
    /// GPT-4o mini - small, fast and cheap
    Gpt4oMini {
        display_name: "GPT-4o mini",
        api_id: "gpt-4o-mini",
        vendor: Vendor::OpenAi,
        context_tokens: 128_000,
        output_tokens: 16_384
    }
);

define_model!(
    /// o3-mini - reasoning model; only accepts the default temperature of 1.0
    O3Mini {
        display_name: "o3-mini",
        api_id: "o3-mini",
        vendor: Vendor::OpenAi,
        context_tokens: 200_000,
        output_tokens: 100_000
    }
);
