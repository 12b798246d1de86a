use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output language for interpretations and labels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Zh,
    En,
}

/// Rhetorical template applied to an interpretation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStyle {
    #[default]
    Classroom,
    Storytelling,
    Intensive,
    FastTalk,
    Dialogue,
}

/// Assumed audience expertise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    /// Language name as written into prompts
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Language::Zh => "Simplified Chinese (简体中文)",
            Language::En => "English",
        }
    }
}

impl AnalysisStyle {
    pub const ALL: [AnalysisStyle; 5] = [
        AnalysisStyle::Classroom,
        AnalysisStyle::Storytelling,
        AnalysisStyle::Intensive,
        AnalysisStyle::FastTalk,
        AnalysisStyle::Dialogue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStyle::Classroom => "classroom",
            AnalysisStyle::Storytelling => "storytelling",
            AnalysisStyle::Intensive => "intensive",
            AnalysisStyle::FastTalk => "fast_talk",
            AnalysisStyle::Dialogue => "dialogue",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            AnalysisStyle::Classroom => {
                "STYLE: CLASSROOM / ACADEMIC
- Structure the output like a high-quality set of lecture notes.
- Use headers like \"## Core Concepts\", \"## Detailed Explanation\", and \"## Key Takeaways\".
- Bold key terms and provide brief definitions if they are technical.
- Tone: Educational, structured, encouraging, and clear.
- End with a \"Self-Check Question\" related to the content."
            }
            AnalysisStyle::Storytelling => {
                "STYLE: STORYTELLING / NARRATIVE
- Transform the information into a compelling narrative flow.
- Use vivid language and analogies to explain what is happening in the video.
- Connect the facts together like a story with a beginning, middle, and end.
- Tone: Engaging, warm, captivating, like a blog post or a documentary narrator.
- Avoid overly rigid lists; use paragraphs that flow into each other."
            }
            AnalysisStyle::Intensive => {
                "STYLE: INTENSIVE / DEEP DIVE
- Provide a rigorous, granular analysis of the content.
- Scrutinize specific claims, data points, or arguments presented.
- If the video mentions specific tools, theories, or people, provide context about them.
- Tone: Critical, analytical, professional, and dense with information.
- Highlight \"Nuances\" or \"Hidden Details\" that a casual viewer might miss."
            }
            AnalysisStyle::FastTalk => {
                "STYLE: FAST TALK / EXECUTIVE SUMMARY
- Focus on high-density information with minimal fluff.
- Use bullet points extensively.
- Sections: \"TL;DR\", \"Actionable Insights\", \"Bottom Line\".
- Tone: Direct, efficient, business-like.
- Maximum impact, minimum reading time."
            }
            AnalysisStyle::Dialogue => {
                "STYLE: DIALOGUE / Q&A
- Present the analysis as a conversation between a curious Student and an Expert Mentor.
- The Student asks relevant questions based on the chapter title.
- The Mentor answers using the specific content from the video.
- Tone: Conversational, Socratic, easy to follow."
            }
        }
    }

    /// Display label used in exports
    pub fn label(&self, lang: Language) -> &'static str {
        match (lang, self) {
            (Language::Zh, AnalysisStyle::Classroom) => "课堂式 (严谨、结构化)",
            (Language::Zh, AnalysisStyle::Storytelling) => "讲故事 (生动、趣味)",
            (Language::Zh, AnalysisStyle::Intensive) => "精读 (深度剖析细节)",
            (Language::Zh, AnalysisStyle::FastTalk) => "速讲 (高效总结要点)",
            (Language::Zh, AnalysisStyle::Dialogue) => "对话 (问答交互感)",
            (Language::En, AnalysisStyle::Classroom) => "Classroom (Formal & Structured)",
            (Language::En, AnalysisStyle::Storytelling) => "Storytelling (Vivid & Fun)",
            (Language::En, AnalysisStyle::Intensive) => "Intensive (Deep Dive Details)",
            (Language::En, AnalysisStyle::FastTalk) => "Fast Talk (Key Points Summary)",
            (Language::En, AnalysisStyle::Dialogue) => "Dialogue (Q&A Style)",
        }
    }
}

impl KnowledgeLevel {
    pub const ALL: [KnowledgeLevel; 3] = [
        KnowledgeLevel::Beginner,
        KnowledgeLevel::Intermediate,
        KnowledgeLevel::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeLevel::Beginner => "beginner",
            KnowledgeLevel::Intermediate => "intermediate",
            KnowledgeLevel::Expert => "expert",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            KnowledgeLevel::Beginner => {
                "LEVEL: BEGINNER (ELI5)
- Assume the reader has ZERO prior knowledge of this topic.
- Use simple analogies to explain complex terms.
- Avoid jargon where possible, or explain it immediately in plain language.
- Keep sentences relatively short and digestible."
            }
            KnowledgeLevel::Intermediate => {
                "LEVEL: INTERMEDIATE
- Assume the reader has a basic understanding but wants to learn more.
- Balance professional terminology with clear explanations.
- Focus on \"How\" and \"Why\", not just \"What\"."
            }
            KnowledgeLevel::Expert => {
                "LEVEL: EXPERT
- Use industry-standard terminology freely.
- Don't waste time explaining basic concepts.
- Focus on advanced implications, edge cases, and technical specifics.
- Treat the reader as a peer in the field."
            }
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (lang, self) {
            (Language::Zh, KnowledgeLevel::Beginner) => "初学者 (通俗易懂)",
            (Language::Zh, KnowledgeLevel::Intermediate) => "进阶者 (平衡专业与科普)",
            (Language::Zh, KnowledgeLevel::Expert) => "专家 (深度专业讨论)",
            (Language::En, KnowledgeLevel::Beginner) => "Beginner (Simple & Clear)",
            (Language::En, KnowledgeLevel::Intermediate) => "Intermediate (Balanced Professionalism)",
            (Language::En, KnowledgeLevel::Expert) => "Expert (Technical Discussion)",
        }
    }
}

macro_rules! impl_str_conversions {
    ($ty:ty, $what:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

impl_str_conversions!(Language, "language", [Language::Zh, Language::En]);
impl_str_conversions!(
    AnalysisStyle,
    "style",
    [
        AnalysisStyle::Classroom,
        AnalysisStyle::Storytelling,
        AnalysisStyle::Intensive,
        AnalysisStyle::FastTalk,
        AnalysisStyle::Dialogue,
    ]
);
impl_str_conversions!(
    KnowledgeLevel,
    "level",
    [KnowledgeLevel::Beginner, KnowledgeLevel::Intermediate, KnowledgeLevel::Expert]
);
