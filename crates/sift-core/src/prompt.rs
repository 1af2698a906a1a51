//! Prompt construction for the extraction pass.
//!
//! Pure computation: no I/O, no retries. The system prompt is a fixed,
//! versioned template; the user prompt interpolates the inbox item's subject
//! and content plus the workspace context (timezone, locale, current date)
//! so the model can ground relative date expressions.

use chrono::NaiveDate;

/// Version identifier of the prompt template, recorded on every extraction.
pub const PROMPT_VERSION: &str = "v1.0.0";

/// Subject line used when an inbox item has none.
pub const NO_SUBJECT: &str = "(No subject)";

/// Fixed system prompt for the extraction pass.
pub const SYSTEM_PROMPT: &str = "\
You are an AI assistant that extracts actionable items from unstructured text content such as emails, notes, and messages.

## Your Task

Analyze the provided content and extract:
1. **Events** - Calendar events with dates, times, and locations
2. **Reminders** - Things the user should be reminded about
3. **Tasks** - Action items or to-dos

## Rules

1. **Only extract what is explicitly mentioned** - Do not hallucinate or infer dates/times that aren't present
2. **Partial success is acceptable** - If only some items can be extracted, that's fine
3. **Be conservative** - When in doubt, don't extract
4. **Use ISO 8601 format for dates** - YYYY-MM-DD for dates, YYYY-MM-DDTHH:MM:SS for datetimes
5. **Preserve context** - Include relevant details in titles and descriptions";

/// Workspace context interpolated into the user prompt.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// IANA timezone identifier, e.g. "Europe/Berlin".
    pub timezone: String,
    /// BCP 47 locale, e.g. "en".
    pub locale: String,
    /// The date extraction runs, for grounding "tomorrow" and friends.
    pub current_date: NaiveDate,
}

impl PromptContext {
    pub fn new(timezone: impl Into<String>, locale: impl Into<String>, current_date: NaiveDate) -> Self {
        Self {
            timezone: timezone.into(),
            locale: locale.into(),
            current_date,
        }
    }
}

/// Build the user prompt for one inbox item.
pub fn build_user_prompt(
    raw_subject: Option<&str>,
    raw_content: &str,
    ctx: &PromptContext,
) -> String {
    let subject = raw_subject.unwrap_or(NO_SUBJECT);
    format!(
        "Subject: {subject}\n\
         \n\
         Content:\n\
         {raw_content}\n\
         \n\
         ---\n\
         Timezone: {timezone}\n\
         Locale: {locale}\n\
         Current Date: {current_date}",
        timezone = ctx.timezone,
        locale = ctx.locale,
        current_date = ctx.current_date.format("%Y-%m-%d"),
    )
}
