//! Question lists and prompt builders for each linear template.

use composer_types::template::TemplateKey;
use super::linear::{PromptInputs, StepSpec, TemplateSpec, REVISION_FIELD};

const TONE_STEP: StepSpec = StepSpec {
    field: "tone",
    prompt: "What tone should it have? (e.g. friendly, formal, confident, or type \"skip\")",
    label: "a tone",
    required: false,
    remember: true,
};

static COVER_LETTER: TemplateSpec = TemplateSpec {
    key: TemplateKey::CoverLetter,
    steps: &[
        StepSpec {
            field: "job_description",
            prompt: "Paste the job description you're applying for.",
            label: "the job description",
            required: true,
            remember: false,
        },
        StepSpec {
            field: "notes",
            prompt: "Anything you want highlighted? Type \"skip\" to use your profile.",
            label: "your notes",
            required: false,
            remember: false,
        },
        TONE_STEP,
    ],
    build_prompt: cover_letter_prompt,
};

static EMAIL: TemplateSpec = TemplateSpec {
    key: TemplateKey::Email,
    steps: &[
        StepSpec {
            field: "job_description",
            prompt: "Paste the job description or the message you're replying to.",
            label: "the job description",
            required: true,
            remember: false,
        },
        StepSpec {
            field: "recipient",
            prompt: "Who is the email for? (name or role, or \"skip\")",
            label: "a recipient",
            required: false,
            remember: true,
        },
        StepSpec {
            field: "notes",
            prompt: "Any points to include? Type \"skip\" to let me decide.",
            label: "your notes",
            required: false,
            remember: false,
        },
        TONE_STEP,
    ],
    build_prompt: email_prompt,
};

static POST_CONTENT: TemplateSpec = TemplateSpec {
    key: TemplateKey::PostContent,
    steps: &[
        StepSpec {
            field: "topic",
            prompt: "What should the post be about?",
            label: "a topic",
            required: true,
            remember: false,
        },
        StepSpec {
            field: "key_points",
            prompt: "Key points, a story or numbers to include? Type \"skip\" to leave it open.",
            label: "key points",
            required: false,
            remember: false,
        },
        TONE_STEP,
    ],
    build_prompt: post_prompt,
};

static COMMENT_REPLY: TemplateSpec = TemplateSpec {
    key: TemplateKey::CommentReply,
    steps: &[
        StepSpec {
            field: "post_text",
            prompt: "Paste the post or comment you want to reply to.",
            label: "the post you're replying to",
            required: true,
            remember: false,
        },
        StepSpec {
            field: "angle",
            prompt: "What do you want to say? (agree, add a point, ask a question… or \"skip\")",
            label: "an angle",
            required: false,
            remember: false,
        },
        TONE_STEP,
    ],
    build_prompt: comment_prompt,
};

static REWRITER: TemplateSpec = TemplateSpec {
    key: TemplateKey::Rewriter,
    steps: &[
        StepSpec {
            field: "text",
            prompt: "Paste the text you want rewritten.",
            label: "the text to rewrite",
            required: true,
            remember: false,
        },
        StepSpec {
            field: "style",
            prompt: "How should it change? (shorter, more formal, clearer… or \"skip\")",
            label: "a style",
            required: false,
            remember: true,
        },
    ],
    build_prompt: rewrite_prompt,
};

/// Step table for a linear template; `None` for the free-form custom prompt.
pub fn spec_for(key: TemplateKey) -> Option<&'static TemplateSpec> {
    match key {
        TemplateKey::CoverLetter => Some(&COVER_LETTER),
        TemplateKey::Email => Some(&EMAIL),
        TemplateKey::PostContent => Some(&POST_CONTENT),
        TemplateKey::CommentReply => Some(&COMMENT_REPLY),
        TemplateKey::Rewriter => Some(&REWRITER),
        TemplateKey::CustomPrompt => None,
    }
}

// ─── Prompt builders ─────────────────────────────────────────

fn cover_letter_prompt(input: &PromptInputs<'_>) -> String {
    let mut prompt = format!(
        "Write a cover letter for the job below.\n\n\
         Job description:\n{}\n\n\
         Additional notes: {}\n\
         Tone: {}\n\
         Length: {}\n",
        input.field("job_description"),
        input.field("notes"),
        input.tone,
        input.length,
    );
    push_background(&mut prompt, input, "About the applicant");
    push_signature(&mut prompt, input);
    push_revision(&mut prompt, input);
    prompt.push_str("\nReturn only the letter text.");
    prompt
}

fn email_prompt(input: &PromptInputs<'_>) -> String {
    let mut prompt = format!(
        "Write an email reply about the job or message below.\n\n\
         Context:\n{}\n\n\
         Recipient: {}\n\
         Additional notes: {}\n\
         Tone: {}\n",
        input.field("job_description"),
        or_unspecified(input.field("recipient")),
        input.field("notes"),
        input.tone,
    );
    push_background(&mut prompt, input, "About the sender");
    push_signature(&mut prompt, input);
    push_revision(&mut prompt, input);
    prompt.push_str(
        "\nRespond with a JSON object with keys \"subjects\" (three subject lines), \
         \"body_formal\", \"body_standard\", \"body_short\" and \"follow_up\".",
    );
    prompt
}

fn post_prompt(input: &PromptInputs<'_>) -> String {
    let mut prompt = format!(
        "Write a social media post.\n\n\
         Topic: {}\n\
         Key points: {}\n\
         Tone: {}\n\
         Length: {}\n",
        input.field("topic"),
        or_unspecified(input.field("key_points")),
        input.tone,
        input.length,
    );
    push_background(&mut prompt, input, "About the author");
    push_revision(&mut prompt, input);
    prompt.push_str(
        "\nRespond with a JSON object {\"variants\": [{\"text\", \"type\", \"length\"}]} \
         holding three different takes.",
    );
    prompt
}

fn comment_prompt(input: &PromptInputs<'_>) -> String {
    let mut prompt = format!(
        "Write a reply to the post below.\n\n\
         Post:\n{}\n\n\
         What the reply should do: {}\n\
         Tone: {}\n",
        input.field("post_text"),
        or_unspecified(input.field("angle")),
        input.tone,
    );
    push_background(&mut prompt, input, "About the commenter");
    push_revision(&mut prompt, input);
    prompt.push_str(
        "\nRespond with a JSON object {\"comments\": [{\"text\", \"type\", \"length\"}]} \
         holding three short replies.",
    );
    prompt
}

fn rewrite_prompt(input: &PromptInputs<'_>) -> String {
    let style = match input.field("style") {
        "" => input.tone,
        style => style,
    };
    let mut prompt = format!(
        "Rewrite the text below. Style: {}.\n\nText:\n{}\n",
        style,
        input.field("text"),
    );
    push_revision(&mut prompt, input);
    prompt.push_str("\nReturn only the rewritten text.");
    prompt
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        "(not specified)"
    } else {
        value
    }
}

fn push_background(prompt: &mut String, input: &PromptInputs<'_>, heading: &str) {
    let language = input.profile.language.trim();
    if !language.is_empty() {
        prompt.push_str(&format!("Language: {}\n", language));
    }
    let lines = input.profile.background_lines();
    if !lines.is_empty() {
        prompt.push_str(&format!("\n{}:\n{}\n", heading, lines.join("\n")));
    }
}

fn push_signature(prompt: &mut String, input: &PromptInputs<'_>) {
    let signature = input.profile.signature.trim();
    if !signature.is_empty() {
        prompt.push_str(&format!("Sign off with:\n{}\n", signature));
    }
}

fn push_revision(prompt: &mut String, input: &PromptInputs<'_>) {
    let revision = input.field(REVISION_FIELD);
    if !revision.is_empty() {
        prompt.push_str(&format!("\nRevise the previous version as follows: {}\n", revision));
    }
}
