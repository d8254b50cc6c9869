/// Localized register strings used by the personalization templates.
///
/// Only a handful of languages carry their own strings; every other language
/// falls back to the English set.
#[derive(Debug, Clone)]
pub struct RegisterStrings {
    // ==================== Devotional Register ====================
    /// Opening salutation inserted before devotional text
    pub devotional_salutation: &'static str,

    /// Closing line appended after devotional text
    pub devotional_sign_off: &'static str,

    // ==================== Casual Register ====================
    /// Emoji appended to casual text
    pub casual_emoji: &'static str,

    /// Hashtag suggested when content has no tags of its own
    pub casual_default_hashtag: &'static str,

    // ==================== Formal Register ====================
    /// Title used for LinkedIn-style previews
    /// Placeholders: {id}
    pub insight_title: &'static str,
}

pub const ENGLISH_STRINGS: RegisterStrings = RegisterStrings {
    devotional_salutation: "🙏",
    devotional_sign_off: "Peace be with you.",
    casual_emoji: "✨",
    casual_default_hashtag: "#Inspiration",
    insight_title: "Multilingual Insight {id}",
};

pub const SPANISH_STRINGS: RegisterStrings = RegisterStrings {
    devotional_salutation: "🙏",
    devotional_sign_off: "La paz sea contigo.",
    casual_emoji: "✨",
    casual_default_hashtag: "#Inspiración",
    insight_title: "Reflexión multilingüe {id}",
};

pub const HINDI_STRINGS: RegisterStrings = RegisterStrings {
    devotional_salutation: "ॐ",
    devotional_sign_off: "हरि ॐ।",
    casual_emoji: "✨",
    casual_default_hashtag: "#प्रेरणा",
    insight_title: "बहुभाषी विचार {id}",
};

pub const SANSKRIT_STRINGS: RegisterStrings = RegisterStrings {
    devotional_salutation: "ॐ",
    devotional_sign_off: "ॐ शान्तिः शान्तिः शान्तिः।",
    casual_emoji: "✨",
    casual_default_hashtag: "#सुभाषितम्",
    insight_title: "बहुभाषी चिन्तनम् {id}",
};

impl RegisterStrings {
    /// Strings for a language code, falling back to English.
    pub fn for_language(code: &str) -> &'static RegisterStrings {
        match code {
            "es" => &SPANISH_STRINGS,
            "hi" | "mr" => &HINDI_STRINGS,
            "sa" => &SANSKRIT_STRINGS,
            _ => &ENGLISH_STRINGS,
        }
    }

    /// Render the insight title for a content id.
    pub fn insight_title_for(&self, content_id: &str) -> String {
        self.insight_title.replace("{id}", content_id)
    }
}
