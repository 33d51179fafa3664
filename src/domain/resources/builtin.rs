//! Core resources shipped with the runtime.
//!
//! Used when a skill does not provide its own file, so that `cancel`,
//! yes/no answers and the generic error dialog work out of the box.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::ResourceKind;
use crate::domain::language::{closest_match, MAX_LANGUAGE_DISTANCE};

type Table = HashMap<(ResourceKind, &'static str), &'static [&'static str]>;

static CORE_RESOURCES: Lazy<HashMap<&'static str, Table>> = Lazy::new(|| {
    let mut en: Table = HashMap::new();
    en.insert(
        (ResourceKind::Vocabulary, "cancel"),
        &[
            "cancel",
            "cancel that",
            "never mind",
            "nevermind",
            "forget it",
            "forget about it",
        ],
    );
    en.insert(
        (ResourceKind::Vocabulary, "yes"),
        &["yes", "yeah", "yep", "sure", "of course", "correct", "affirmative", "ok", "okay"],
    );
    en.insert(
        (ResourceKind::Vocabulary, "no"),
        &["no", "nope", "nah", "negative", "not really", "no way"],
    );
    en.insert(
        (ResourceKind::Vocabulary, "last"),
        &["last", "last one", "final", "final one"],
    );
    en.insert(
        (ResourceKind::Dialog, "skill.error"),
        &["An error occurred while processing a request in {skill}"],
    );
    en.insert((ResourceKind::Word, "or"), &["or"]);
    en.insert((ResourceKind::Word, "and"), &["and"]);

    let mut pt: Table = HashMap::new();
    pt.insert(
        (ResourceKind::Vocabulary, "cancel"),
        &["cancelar", "cancela", "esquece", "esquece isso", "deixa para lá"],
    );
    pt.insert(
        (ResourceKind::Vocabulary, "yes"),
        &["sim", "claro", "certo", "afirmativo"],
    );
    pt.insert((ResourceKind::Vocabulary, "no"), &["não", "nao", "negativo"]);
    pt.insert((ResourceKind::Vocabulary, "last"), &["último", "ultimo", "última", "ultima"]);
    pt.insert(
        (ResourceKind::Dialog, "skill.error"),
        &["Ocorreu um erro ao processar um pedido em {skill}"],
    );
    pt.insert((ResourceKind::Word, "or"), &["ou"]);
    pt.insert((ResourceKind::Word, "and"), &["e"]);

    let mut tables = HashMap::new();
    tables.insert("en", en);
    tables.insert("pt", pt);
    tables
});

/// Core resource lines for the language closest to `lang`, if any.
pub fn core_resource(lang: &str, kind: ResourceKind, name: &str) -> Option<Vec<String>> {
    let languages: Vec<String> = CORE_RESOURCES.keys().map(|k| k.to_string()).collect();
    let (closest, distance) = closest_match(lang, &languages)?;
    if distance >= MAX_LANGUAGE_DISTANCE {
        return None;
    }
    CORE_RESOURCES
        .get(closest.as_str())
        .and_then(|table| table.get(&(kind, name)))
        .map(|lines| lines.iter().map(|l| l.to_string()).collect())
}
