//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the study-material LLM.
//! It implements the `GenerationEngine` port from the `core` crate.

use std::sync::OnceLock;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use mindload_core::{
    domain::{Flashcard, GenerationDepth, QuizQuestion},
    ports::{GenerationEngine, PortError, PortResult},
};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

const FLASHCARD_INSTRUCTIONS: &str = r#"You are a study assistant that writes flashcards from a student's material.
Respond with ONLY a JSON object of the form:
{"flashcards": [{"front": "question or term", "back": "answer or definition"}]}
Each card must test one fact taken from the material. Do not invent facts."#;

const QUIZ_INSTRUCTIONS: &str = r#"You are a study assistant that writes multiple-choice quiz questions from a student's material.
Respond with ONLY a JSON object of the form:
{"questions": [{"question": "...", "options": ["...", "...", "...", "..."], "correct_answer": 0, "explanation": "..."}]}
"correct_answer" is the zero-based index of the right option. Every question has exactly four options."#;

/// Upper bound on how much source text is sent with a single request.
const MAX_PROMPT_CHARS: usize = 60_000;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationEngine` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Sends one system + user exchange and returns the text of the first choice.
    async fn complete(
        &self,
        instructions: &str,
        user_input: String,
        depth: GenerationDepth,
    ) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .temperature(temperature(depth))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Generation LLM response contained no text content.".to_string())
            })
    }
}

//=========================================================================================
// Prompt and Payload Helpers
//=========================================================================================

fn temperature(depth: GenerationDepth) -> f32 {
    match depth {
        GenerationDepth::Quick => 0.7,
        GenerationDepth::Standard => 0.5,
        GenerationDepth::Deep => 0.3,
    }
}

fn depth_guidance(depth: GenerationDepth) -> &'static str {
    match depth {
        GenerationDepth::Quick => "Focus on the headline facts and definitions.",
        GenerationDepth::Standard => "Cover the key concepts and how they relate.",
        GenerationDepth::Deep => {
            "Cover key concepts, their relationships, edge cases and applications."
        }
    }
}

fn build_user_input(kind: &str, text: &str, count: usize, depth: GenerationDepth) -> String {
    let material: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        "Write exactly {} {}. {}\n\nMATERIAL:\n---\n{}\n---",
        count,
        kind,
        depth_guidance(depth),
        material
    )
}

/// Models sometimes wrap JSON in a markdown code fence; returns the inner text.
fn strip_code_fence(raw: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").ok())
        .as_ref()
        .and_then(|fence| fence.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| raw.trim())
}

#[derive(Deserialize)]
struct FlashcardPayload {
    #[serde(default)]
    flashcards: Vec<RawFlashcard>,
}

#[derive(Deserialize)]
struct RawFlashcard {
    front: String,
    back: String,
}

#[derive(Deserialize)]
struct QuizPayload {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parses the flashcard payload, dropping cards with an empty side.
fn parse_flashcards(raw: &str) -> PortResult<Vec<Flashcard>> {
    let payload: FlashcardPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| PortError::Unexpected(format!("Malformed flashcard payload: {}", e)))?;
    Ok(payload
        .flashcards
        .into_iter()
        .filter(|c| !c.front.trim().is_empty() && !c.back.trim().is_empty())
        .map(|c| Flashcard::new(c.front.trim(), c.back.trim()))
        .collect())
}

/// Parses the quiz payload, dropping questions whose answer index is unusable.
fn parse_questions(raw: &str) -> PortResult<Vec<QuizQuestion>> {
    let payload: QuizPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| PortError::Unexpected(format!("Malformed quiz payload: {}", e)))?;
    Ok(payload
        .questions
        .into_iter()
        .filter(|q| {
            !q.question.trim().is_empty() && q.options.len() >= 2 && q.correct_answer < q.options.len()
        })
        .map(|q| QuizQuestion {
            question: q.question.trim().to_string(),
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation.filter(|e| !e.trim().is_empty()),
        })
        .collect())
}

//=========================================================================================
// `GenerationEngine` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationEngine for OpenAiGenerationAdapter {
    async fn generate_flashcards_from_content(
        &self,
        text: &str,
        count: usize,
        depth: GenerationDepth,
    ) -> PortResult<Vec<Flashcard>> {
        let raw = self
            .complete(
                FLASHCARD_INSTRUCTIONS,
                build_user_input("flashcards", text, count, depth),
                depth,
            )
            .await?;
        let cards = parse_flashcards(&raw)?;
        if cards.len() < count {
            warn!("Asked for {} flashcards, model produced {}", count, cards.len());
        }
        info!("Generated {} flashcards", cards.len());
        Ok(cards)
    }

    async fn generate_quiz_questions_from_content(
        &self,
        text: &str,
        count: usize,
        depth: GenerationDepth,
    ) -> PortResult<Vec<QuizQuestion>> {
        let raw = self
            .complete(
                QUIZ_INSTRUCTIONS,
                build_user_input("multiple-choice questions", text, count, depth),
                depth,
            )
            .await?;
        let questions = parse_questions(&raw)?;
        info!("Generated {} quiz questions", questions.len());
        Ok(questions)
    }
}
