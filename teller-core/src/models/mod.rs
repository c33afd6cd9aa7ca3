//! Pre-configured model definitions
//!
//! - `openai` - GPT-4o family and the o3-mini reasoning model
//! - `google` - Gemini models

mod google;
mod openai;

pub use google::*;
pub use openai::*;

use crate::model::Model;

/// Generate a unit struct implementing [`Model`]
macro_rules! define_model {
    (
        $(#[$meta:meta])*
        $name:ident {
            display_name: $display_name:expr,
            api_id: $api_id:expr,
            vendor: $vendor:expr,
            context_tokens: $context_tokens:expr,
            output_tokens: $output_tokens:expr
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::model::Model for $name {
            fn name(&self) -> &str {
                $display_name
            }

            fn api_id(&self) -> &str {
                $api_id
            }

            fn vendor(&self) -> $crate::model::Vendor {
                $vendor
            }

            fn max_context_tokens(&self) -> usize {
                $context_tokens
            }

            fn max_output_tokens(&self) -> usize {
                $output_tokens
            }
        }
    };
}

pub(crate) use define_model;

/// Token limits of a preset, looked up by API id
pub(crate) fn known_limits(api_id: &str) -> Option<(usize, usize)> {
    let presets: [&dyn Model; 4] = [&Gpt4o, &Gpt4oMini, &O3Mini, &Gemini2Flash];
    presets
        .iter()
        .find(|m| m.api_id() == api_id)
        .map(|m| (m.max_context_tokens(), m.max_output_tokens()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vendor;

    #[test]
    fn test_presets() {
        assert_eq!(Gemini2Flash.api_id(), "gemini-2.0-flash-001");
        assert_eq!(Gemini2Flash.vendor(), Vendor::Google);
        assert_eq!(O3Mini.api_id(), "o3-mini");
        assert_eq!(O3Mini.vendor(), Vendor::OpenAi);
        assert_eq!(Gpt4oMini.max_context_tokens(), 128_000);
    }

    #[test]
    fn test_known_limits() {
        assert_eq!(known_limits("o3-mini"), Some((200_000, 100_000)));
        assert_eq!(known_limits("unknown"), None);
    }

    #[test]
    fn test_model_ids_have_no_spaces() {
        let models: [&dyn Model; 4] = [&Gpt4o, &Gpt4oMini, &O3Mini, &Gemini2Flash];
        for model in models {
            assert!(!model.api_id().contains(' '), "{}", model.api_id());
        }
    }
}
