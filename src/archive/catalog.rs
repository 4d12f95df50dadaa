//! JSON documents stored in the `col` table.
//!
//! Anki keeps note types, decks and deck options as JSON blobs inside the
//! single `col` row. Only the keys this crate reads back are required when
//! deserializing; the rest default so archives written by other tools still
//! parse.

use super::ArchiveError;
use crate::schema::FieldSchema;
use crate::types::{CardTemplate, Deck, Model, Requirement, RequirementKind};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Note type kind `0`: standard (non-cloze).
const STANDARD_MODEL: i64 = 0;

/// ID Anki reserves for the always-present default deck and options group.
pub const DEFAULT_DECK_ID: u64 = 1;

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";
const LATEX_POST: &str = "\\end{document}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub ord: usize,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub rtl: bool,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub size: u32,
    #[serde(default)]
    pub media: Vec<Value>,
}

fn default_font() -> String {
    "Liberation Sans".into()
}

fn default_font_size() -> u32 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub name: String,
    pub ord: usize,
    pub qfmt: String,
    pub afmt: String,
    #[serde(default)]
    pub did: Option<u64>,
    #[serde(default)]
    pub bqfmt: String,
    #[serde(default)]
    pub bafmt: String,
}

/// One `req` entry: `[template ord, "any" | "all", [field ords]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry(pub usize, pub String, pub Vec<usize>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub id: Value,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(rename = "mod", default)]
    pub modified: i64,
    #[serde(default)]
    pub usn: i64,
    #[serde(default)]
    pub sortf: usize,
    #[serde(default)]
    pub did: Option<u64>,
    pub flds: Vec<FieldEntry>,
    pub tmpls: Vec<TemplateEntry>,
    #[serde(default)]
    pub css: String,
    #[serde(rename = "latexPre", default)]
    pub latex_pre: String,
    #[serde(rename = "latexPost", default)]
    pub latex_post: String,
    #[serde(default)]
    pub latexsvg: bool,
    #[serde(default)]
    pub req: Vec<RequirementEntry>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub vers: Vec<Value>,
}

impl ModelEntry {
    /// Catalog entry for a model about to be written into `deck`.
    pub fn from_model(model: &Model, deck: &Deck, modified: i64) -> Self {
        let flds = model
            .schema
            .names()
            .iter()
            .enumerate()
            .map(|(ord, name)| FieldEntry {
                name: name.clone(),
                ord,
                sticky: false,
                rtl: false,
                font: default_font(),
                size: default_font_size(),
                media: Vec::new(),
            })
            .collect();
        let tmpls = model
            .templates
            .iter()
            .enumerate()
            .map(|(ord, t)| TemplateEntry {
                name: t.name.clone(),
                ord,
                qfmt: t.question.clone(),
                afmt: t.answer.clone(),
                did: None,
                bqfmt: String::new(),
                bafmt: String::new(),
            })
            .collect();
        let req = model
            .templates
            .iter()
            .enumerate()
            .map(|(ord, t)| {
                let ords = t
                    .requirement
                    .fields
                    .iter()
                    .filter_map(|name| model.schema.position(name))
                    .collect();
                RequirementEntry(ord, t.requirement.kind.as_str().to_string(), ords)
            })
            .collect();

        Self {
            id: json!(model.id),
            name: model.name.clone(),
            kind: STANDARD_MODEL,
            modified,
            usn: -1,
            sortf: 0,
            did: Some(deck.id),
            flds,
            tmpls,
            css: model.css.clone(),
            latex_pre: LATEX_PRE.into(),
            latex_post: LATEX_POST.into(),
            latexsvg: false,
            req,
            tags: Vec::new(),
            vers: Vec::new(),
        }
    }

    /// Rebuild a [`Model`] stored under `id`.
    pub fn into_model(mut self, id: u64) -> Result<Model, ArchiveError> {
        self.flds.sort_by_key(|f| f.ord);
        self.tmpls.sort_by_key(|t| t.ord);

        let schema = FieldSchema::from_header(self.flds.iter().map(|f| f.name.clone()))
            .map_err(|e| ArchiveError::InvalidCatalog(format!("model {id}: {e}")))?;

        let templates = self
            .tmpls
            .iter()
            .map(|t| CardTemplate {
                name: t.name.clone(),
                question: t.qfmt.clone(),
                answer: t.afmt.clone(),
                requirement: requirement_for(&self.req, t.ord, &schema),
            })
            .collect();

        Ok(Model {
            id,
            name: self.name,
            schema,
            templates,
            css: self.css,
        })
    }
}

fn requirement_for(req: &[RequirementEntry], ord: usize, schema: &FieldSchema) -> Requirement {
    let Some(RequirementEntry(_, kind, fields)) = req.iter().find(|r| r.0 == ord) else {
        return Requirement::any(Vec::<String>::new());
    };
    Requirement {
        kind: RequirementKind::parse(kind).unwrap_or(RequirementKind::Any),
        fields: fields
            .iter()
            .filter_map(|&i| schema.get(i).map(String::from))
            .collect(),
    }
}

/// `col.models` for a single-model archive.
pub fn models_json(model: &Model, deck: &Deck, modified: i64) -> Result<String, ArchiveError> {
    let mut models = BTreeMap::new();
    models.insert(model.id.to_string(), ModelEntry::from_model(model, deck, modified));
    Ok(serde_json::to_string(&models)?)
}

/// Parse `col.models` into models keyed by ID.
pub fn parse_models(raw: &str) -> Result<BTreeMap<u64, Model>, ArchiveError> {
    let entries: BTreeMap<String, ModelEntry> = serde_json::from_str(raw)?;
    let mut models = BTreeMap::new();
    for (key, entry) in entries {
        let id: u64 = key
            .parse()
            .map_err(|_| ArchiveError::InvalidCatalog(format!("model key {key:?} is not an ID")))?;
        models.insert(id, entry.into_model(id)?);
    }
    Ok(models)
}

fn deck_entry(id: u64, name: &str, modified: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "mod": modified,
        "usn": -1,
        "collapsed": false,
        "browserCollapsed": false,
        "desc": "",
        "dyn": 0,
        "conf": DEFAULT_DECK_ID,
        "extendNew": 0,
        "extendRev": 0,
        "lrnToday": [0, 0],
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
    })
}

/// `col.decks`: the default deck plus `deck`.
pub fn decks_json(deck: &Deck, modified: i64) -> String {
    let mut decks = serde_json::Map::new();
    decks.insert(
        DEFAULT_DECK_ID.to_string(),
        deck_entry(DEFAULT_DECK_ID, "Default", modified),
    );
    decks.insert(deck.id.to_string(), deck_entry(deck.id, &deck.name, modified));
    Value::Object(decks).to_string()
}

/// `col.conf`: collection-wide settings.
pub fn collection_conf_json(deck: &Deck, model: &Model) -> String {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": deck.id,
        "curModel": model.id.to_string(),
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0,
    })
    .to_string()
}

/// `col.dconf`: the default options group.
pub fn deck_options_json(modified: i64) -> String {
    json!({
        DEFAULT_DECK_ID.to_string(): {
            "id": DEFAULT_DECK_ID,
            "name": "Default",
            "mod": modified,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "timer": 0,
            "replayq": true,
            "dyn": false,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100
            }
        }
    })
    .to_string()
}
