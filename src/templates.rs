//! Card template synthesis.
//!
//! The card layout is chosen from the columns the input file declares. The
//! decision is a priority cascade:
//!
//! | Declared markers | Layout | Templates |
//! |---|---|---|
//! | none | `Basic Vanilla` | front → back |
//! | `Reverse` | `Basic Reverse` | front → back, back → front |
//! | `Listen` | `Basic Listen` | sound → front + back |
//! | `Listen`, `Reverse` | `Basic Listen Reverse` | sound → front + back, back → front |
//! | `Q&A` | `Basic Q&A` | `Q:` front → `A:` back |
//! | `Q&A`, `Listen` | `Basic Q&A Listen` | `Q:` sound → front + `A:` back |
//!
//! `Listen` needs a declared `Sound` or `Audio` column and `Reverse` cannot be
//! combined with `Q&A`; both are rejected before any note is built.
//!
//! Optional columns (sound, phonetics, remark, image, more and the `_Answer`
//! companions written by enrichment) are wrapped in Anki conditional
//! sections, so a field that exists but is empty renders nothing.
//!
//! Markup is produced with maud. Field placeholders go through
//! [`PreEscaped`] because names like `Q&A` must reach Anki verbatim.

use crate::schema::FieldSchema;
use crate::types::{CardTemplate, Model, Requirement};
use log::warn;
use maud::{Markup, PreEscaped, html};
use thiserror::Error;

pub const LISTEN: &str = "Listen";
pub const QUESTION_ANSWER: &str = "Q&A";
pub const REVERSE: &str = "Reverse";
pub const SOUND_FIELDS: &[&str] = &["Sound", "Audio"];
pub const PHONETICS: &str = "Phonetics";
pub const SOUND_ANSWER: &str = "Sound_Answer";
pub const PHONETICS_ANSWER: &str = "Phonetics_Answer";
pub const REMARK_FIELDS: &[&str] = &["Remark", "Extra"];
pub const IMAGE: &str = "Image";
pub const MORE: &str = "More";

/// Stock card style, used when no CSS file is configured.
pub const DEFAULT_CSS: &str = include_str!("../static/style.css");

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Column 'Listen' requires a 'Sound' or 'Audio' column")]
    ListenWithoutSound,
    #[error("Columns 'Reverse' and 'Q&A' cannot be combined")]
    ReverseWithQuestionAnswer,
}

/// Which card arrangement a schema asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLayout {
    Vanilla,
    Reverse,
    Listen,
    ListenReverse,
    QuestionAnswer,
    QuestionAnswerListen,
}

impl CardLayout {
    /// Detect the layout from the columns the input header declared.
    pub fn detect(schema: &FieldSchema) -> Result<Self, TemplateError> {
        let listen = schema.declares(LISTEN);
        let qa = schema.declares(QUESTION_ANSWER);
        let reverse = schema.declares(REVERSE);

        if listen && schema.first_declared(SOUND_FIELDS).is_none() {
            return Err(TemplateError::ListenWithoutSound);
        }
        if reverse && qa {
            return Err(TemplateError::ReverseWithQuestionAnswer);
        }

        Ok(match (qa, listen, reverse) {
            (true, true, _) => CardLayout::QuestionAnswerListen,
            (true, false, _) => CardLayout::QuestionAnswer,
            (false, true, true) => CardLayout::ListenReverse,
            (false, true, false) => CardLayout::Listen,
            (false, false, true) => CardLayout::Reverse,
            (false, false, false) => CardLayout::Vanilla,
        })
    }

    pub fn model_name(self) -> &'static str {
        match self {
            CardLayout::Vanilla => "Basic Vanilla",
            CardLayout::Reverse => "Basic Reverse",
            CardLayout::Listen => "Basic Listen",
            CardLayout::ListenReverse => "Basic Listen Reverse",
            CardLayout::QuestionAnswer => "Basic Q&A",
            CardLayout::QuestionAnswerListen => "Basic Q&A Listen",
        }
    }

    pub fn listens(self) -> bool {
        matches!(
            self,
            CardLayout::Listen | CardLayout::ListenReverse | CardLayout::QuestionAnswerListen
        )
    }

    pub fn labels_sides(self) -> bool {
        matches!(
            self,
            CardLayout::QuestionAnswer | CardLayout::QuestionAnswerListen
        )
    }

    pub fn reverses(self) -> bool {
        matches!(self, CardLayout::Reverse | CardLayout::ListenReverse)
    }
}

/// Alternating `Q: ` / `A: ` side labels.
///
/// Created fresh for every synthesized model so no state survives between
/// builds. Disabled labels are always empty.
#[derive(Debug)]
struct SideLabels {
    enabled: bool,
    question_next: bool,
}

impl SideLabels {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            question_next: true,
        }
    }

    fn next(&mut self) -> &'static str {
        if !self.enabled {
            return "";
        }
        let label = if self.question_next { "Q: " } else { "A: " };
        self.question_next = !self.question_next;
        label
    }
}

/// Field names resolved against one schema.
struct Slots<'a> {
    front: &'a str,
    back: Option<&'a str>,
    qa: Option<&'a str>,
    sound: Option<&'a str>,
    phonetics: Option<&'a str>,
    sound_answer: Option<&'a str>,
    phonetics_answer: Option<&'a str>,
    remark: Option<&'a str>,
    image: Option<&'a str>,
    more: Option<&'a str>,
}

impl<'a> Slots<'a> {
    fn resolve(schema: &'a FieldSchema) -> Self {
        let present = |name: &'a str| schema.contains(name).then_some(name);
        let preferred = |names: &[&'a str]| {
            schema
                .first_declared(names)
                .or_else(|| schema.first_present(names))
        };
        Self {
            front: schema.get(0).unwrap_or_default(),
            back: schema.get(1),
            qa: schema.declares(QUESTION_ANSWER).then_some(QUESTION_ANSWER),
            sound: preferred(SOUND_FIELDS),
            phonetics: present(PHONETICS),
            sound_answer: present(SOUND_ANSWER),
            phonetics_answer: present(PHONETICS_ANSWER),
            remark: preferred(REMARK_FIELDS),
            image: present(IMAGE),
            more: present(MORE),
        }
    }
}

/// `{{Name}}`
fn field(name: &str) -> PreEscaped<String> {
    PreEscaped(format!("{{{{{name}}}}}"))
}

/// `{{#Name}}<div class="…">{{Name}}</div>{{/Name}}`, or nothing.
fn optional_block(name: Option<&str>, class: &str) -> Markup {
    match name {
        Some(name) => html! {
            (PreEscaped(format!("{{{{#{name}}}}}")))
            div class=(class) { (field(name)) }
            (PreEscaped(format!("{{{{/{name}}}}}")))
        },
        None => html! {},
    }
}

fn auxiliary_blocks(slots: &Slots) -> Markup {
    html! {
        (optional_block(slots.remark, "remark"))
        (optional_block(slots.image, "image"))
        (optional_block(slots.more, "more"))
    }
}

fn front_side_divider() -> Markup {
    html! {
        (PreEscaped("{{FrontSide}}"))
        hr id="answer";
    }
}

fn recognition_card(slots: &Slots, labels: &mut SideLabels) -> CardTemplate {
    let question_label = labels.next();
    let answer_label = labels.next();
    let question = html! {
        (optional_block(slots.qa, "qa"))
        div.front { (question_label) (field(slots.front)) }
        (optional_block(slots.sound, "sound"))
        (optional_block(slots.phonetics, "phonetics"))
    };
    let answer = html! {
        (front_side_divider())
        @if let Some(back) = slots.back {
            div.back { (answer_label) (field(back)) }
        }
        (optional_block(slots.sound_answer, "sound"))
        (optional_block(slots.phonetics_answer, "phonetics"))
        (auxiliary_blocks(slots))
    };
    CardTemplate {
        name: "Card 1".into(),
        question: question.into_string(),
        answer: answer.into_string(),
        requirement: Requirement::any([slots.front]),
    }
}

fn listening_card(slots: &Slots, sound: &str, labels: &mut SideLabels) -> CardTemplate {
    let question_label = labels.next();
    let answer_label = labels.next();
    let question = html! {
        (optional_block(slots.qa, "qa"))
        div.listen { (question_label) (field(sound)) }
    };
    let answer = html! {
        (front_side_divider())
        div.front { (field(slots.front)) }
        (optional_block(slots.phonetics, "phonetics"))
        @if let Some(back) = slots.back {
            div.back { (answer_label) (field(back)) }
        }
        (optional_block(slots.sound_answer, "sound"))
        (optional_block(slots.phonetics_answer, "phonetics"))
        (auxiliary_blocks(slots))
    };
    CardTemplate {
        name: "Card 1".into(),
        question: question.into_string(),
        answer: answer.into_string(),
        requirement: Requirement::any([sound]),
    }
}

fn reverse_card(slots: &Slots, back: &str) -> CardTemplate {
    let question = html! {
        (PreEscaped(format!("{{{{#{REVERSE}}}}}")))
        div.back { (field(back)) }
        (optional_block(slots.sound_answer, "sound"))
        (optional_block(slots.phonetics_answer, "phonetics"))
        (PreEscaped(format!("{{{{/{REVERSE}}}}}")))
    };
    let answer = html! {
        (front_side_divider())
        div.front { (field(slots.front)) }
        (optional_block(slots.sound, "sound"))
        (optional_block(slots.phonetics, "phonetics"))
        (auxiliary_blocks(slots))
    };
    CardTemplate {
        name: "Card 2".into(),
        question: question.into_string(),
        answer: answer.into_string(),
        requirement: Requirement::all([REVERSE, back]),
    }
}

/// Synthesize the model name and card templates for `schema`.
pub fn synthesize(schema: &FieldSchema) -> Result<(String, Vec<CardTemplate>), TemplateError> {
    let layout = CardLayout::detect(schema)?;
    let slots = Slots::resolve(schema);
    let mut labels = SideLabels::new(layout.labels_sides());

    let mut templates = Vec::with_capacity(2);
    match schema.first_declared(SOUND_FIELDS) {
        Some(sound) if layout.listens() => {
            templates.push(listening_card(&slots, sound, &mut labels))
        }
        _ => templates.push(recognition_card(&slots, &mut labels)),
    }

    if layout.reverses() {
        match slots.back {
            Some(back) => templates.push(reverse_card(&slots, back)),
            None => warn!("'{REVERSE}' column present but there is no back field to reverse"),
        }
    }

    Ok((layout.model_name().to_string(), templates))
}

/// Synthesize templates and wrap them in a [`Model`].
pub fn build_model(schema: FieldSchema, css: &str) -> Result<Model, TemplateError> {
    let (name, templates) = synthesize(&schema)?;
    Ok(Model::new(name, schema, templates, css))
}
