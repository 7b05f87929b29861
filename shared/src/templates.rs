/*
 * Copyright © 2026 Volodymyr Kadzhaia
 * Copyright © 2026 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every placeholder a template may reference. Anything else is rejected
/// when the template is built.
pub const PLACEHOLDERS: [&str; 6] = ["actor_clause", "title_clause", "year", "year2", "actor", "title"];

/// Predicate bound to an optional clause that should not filter anything
pub const ALWAYS_TRUE: &str = "true";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{name}}} in template #{index}")]
    UnknownPlaceholder { index: usize, name: String },
    #[error("template library is empty")]
    EmptyLibrary,
    #[error("invalid template library: {0}")]
    Parse(String),
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Escapes a value so it can sit inside a single-quoted Cypher string literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Concrete values for every placeholder of the closed set.
///
/// A template that does not mention a placeholder simply ignores the
/// corresponding binding. `actor` and `title` are expected to be escaped
/// already (see [`escape_literal`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub actor_clause: String,
    pub title_clause: String,
    pub year: i64,
    pub year2: i64,
    pub actor: String,
    pub title: String,
}

impl Bindings {
    /// Builds an equality predicate such as `a.name = 'Keanu Reeves'`.
    pub fn equality_clause(target: &str, raw_value: &str) -> String {
        format!("{} = '{}'", target, escape_literal(raw_value))
    }

    fn value_of(&self, placeholder: &str) -> Option<String> {
        match placeholder {
            "actor_clause" => Some(self.actor_clause.clone()),
            "title_clause" => Some(self.title_clause.clone()),
            "year" => Some(self.year.to_string()),
            "year2" => Some(self.year2.to_string()),
            "actor" => Some(self.actor.clone()),
            "title" => Some(self.title.clone()),
            _ => None,
        }
    }
}

/// A parameterised Cypher query. Identity is its position in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    text: String,
}

impl QueryTemplate {
    fn parse(index: usize, text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        for caps in placeholder_regex().captures_iter(&text) {
            let name = &caps[1];
            if !PLACEHOLDERS.contains(&name) {
                return Err(TemplateError::UnknownPlaceholder {
                    index,
                    name: name.to_string(),
                });
            }
        }
        Ok(QueryTemplate { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholders referenced by this template, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder_regex()
            .captures_iter(&self.text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    pub fn uses(&self, placeholder: &str) -> bool {
        self.placeholders().contains(&placeholder)
    }

    pub fn render(&self, bindings: &Bindings) -> String {
        placeholder_regex()
            .replace_all(&self.text, |caps: &Captures| {
                bindings
                    .value_of(&caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Fixed, ordered collection of query templates over the movie graph.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<QueryTemplate>,
}

impl TemplateLibrary {
    pub fn builtin() -> Self {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .enumerate()
            .map(|(index, text)| QueryTemplate::parse(index, *text))
            .collect::<Result<Vec<_>, _>>()
            .expect("built-in templates only use known placeholders");
        TemplateLibrary { templates }
    }

    pub fn from_texts<I, S>(texts: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let templates = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| QueryTemplate::parse(index, text))
            .collect::<Result<Vec<_>, _>>()?;
        if templates.is_empty() {
            return Err(TemplateError::EmptyLibrary);
        }
        Ok(TemplateLibrary { templates })
    }

    /// Reads a JSON array of template strings.
    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        let texts: Vec<String> =
            serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))?;
        Self::from_texts(texts)
    }

    pub fn template_at(&self, index: usize) -> Option<&QueryTemplate> {
        self.templates.get(index)
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryTemplate> {
        self.templates.iter()
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

pub const BUILTIN_TEMPLATES: &[&str] = &[
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie)<-[:DIRECTED]-(d:Person) \
     WHERE {actor_clause} AND m.released IS NOT NULL AND d.born IS NOT NULL AND m.released > {year} \
     WITH a, d, m, m.released - a.born AS age_at_release \
     WHERE age_at_release > 30 \
     RETURN a.name, m.title, d.name, age_at_release ORDER BY age_at_release DESC",
    "MATCH (m:Movie)<-[:ACTED_IN]-(a:Person), (m)<-[:DIRECTED]-(d:Person) \
     WHERE m.released IS NOT NULL AND {actor_clause} AND d.name CONTAINS 'e' AND m.released < {year2} \
     RETURN m.title, collect(DISTINCT a.name) AS cast, d.name ORDER BY size(cast) DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WHERE {actor_clause} AND a.born IS NOT NULL AND m.released IS NOT NULL AND m.released >= {year} \
     WITH a.name AS actor, count(m) AS total, avg(m.released - a.born) AS avg_gap \
     WHERE total > 2 \
     RETURN actor, total, avg_gap ORDER BY avg_gap DESC",
    "MATCH (d:Person)-[:DIRECTED]->(m:Movie)<-[:ACTED_IN]-(a:Person) \
     WHERE {title_clause} AND d.born IS NOT NULL AND a.born IS NOT NULL AND m.released < {year2} \
     RETURN m.title, d.name, a.name, m.released - d.born AS d_gap, m.released - a.born AS a_gap",
    "MATCH (m:Movie)<-[:ACTED_IN]-(a:Person) \
     WHERE m.released >= {year} AND m.released IS NOT NULL AND a.born IS NOT NULL AND {title_clause} \
     WITH m.title AS movie, collect(a.name) AS cast, avg(m.released - a.born) AS avg_age \
     RETURN movie, cast, avg_age ORDER BY avg_age DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie), (d:Person)-[:DIRECTED]->(m) \
     WHERE m.released >= {year} AND m.released <= {year2} AND a.born IS NOT NULL AND d.born IS NOT NULL AND {title_clause} \
     WITH a, d, m \
     RETURN a.name, d.name, m.title ORDER BY m.released",
    "MATCH (m:Movie)<-[:ACTED_IN]-(a:Person) \
     WHERE m.title STARTS WITH 'The' AND a.born IS NOT NULL AND {actor_clause} AND m.released >= {year} \
     RETURN m.title, a.name, m.released ORDER BY m.released DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WHERE {actor_clause} AND m.tagline IS NOT NULL AND m.released IS NOT NULL AND m.released < {year2} \
     RETURN a.name, m.title, m.tagline, m.released",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WITH a.name AS actor, collect(m.title) AS films, count(*) AS num \
     WHERE num > 2 AND actor = '{actor}' \
     RETURN actor, films, num ORDER BY num DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WHERE m.released IS NOT NULL AND {actor_clause} AND m.released >= {year} AND m.released <= {year2} \
     WITH m.title AS movie, count(DISTINCT a.name) AS cast_size \
     RETURN movie, cast_size ORDER BY cast_size DESC",
    "MATCH (m:Movie)<-[:ACTED_IN]-(a:Person)-[:DIRECTED]->(m2:Movie) \
     WHERE m.released IS NOT NULL AND m2.released IS NOT NULL AND {title_clause} \
     RETURN a.name, m.title, m2.title, m.released, m2.released",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WHERE {actor_clause} AND a.born IS NOT NULL AND m.released IS NOT NULL AND m.released >= {year} \
     RETURN a.name, m.title, m.released - a.born AS age_at_release ORDER BY age_at_release",
    "MATCH (a:Person)-[:DIRECTED]->(m:Movie) \
     WHERE {actor_clause} AND a.born IS NOT NULL AND m.released IS NOT NULL AND m.released < {year2} \
     RETURN a.name, m.title, m.released - a.born AS dir_age ORDER BY dir_age DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie)<-[:DIRECTED]-(d:Person) \
     WHERE {actor_clause} AND d.name IS NOT NULL \
     RETURN a.name, d.name, m.title ORDER BY m.title",
    "MATCH (m:Movie)<-[:ACTED_IN]-(a:Person) \
     WHERE m.released IS NOT NULL AND {title_clause} \
     WITH m, count(a) AS cast_size \
     RETURN m.title, cast_size ORDER BY cast_size DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie), (a)-[:DIRECTED]->(m2:Movie) \
     WHERE m.released >= {year} AND m2.released IS NOT NULL AND {actor_clause} \
     RETURN a.name, m.title AS acted_in, m2.title AS directed",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) \
     WHERE {actor_clause} AND {title_clause} AND m.released IS NOT NULL AND m.released > {year} \
     RETURN a.name, m.title, m.released ORDER BY m.released",
    "MATCH (m:Movie) \
     WHERE m.released IS NOT NULL AND {title_clause} AND m.released >= {year} AND m.tagline IS NOT NULL \
     RETURN m.title, m.released, m.tagline ORDER BY m.released DESC",
    "MATCH (a:Person) \
     WHERE {actor_clause} AND a.born IS NOT NULL \
     RETURN a.name, a.born ORDER BY a.born DESC",
    "MATCH (a:Person)-[:ACTED_IN]->(m:Movie)<-[:DIRECTED]-(d:Person) \
     WHERE {actor_clause} AND d.born IS NOT NULL AND m.released IS NOT NULL AND m.released > {year} \
     WITH a, d, m, m.released - a.born AS act_age, m.released - d.born AS dir_age \
     RETURN a.name, d.name, m.title, act_age, dir_age",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn unfiltered(year: i64, year2: i64) -> Bindings {
        Bindings {
            actor_clause: ALWAYS_TRUE.to_string(),
            title_clause: ALWAYS_TRUE.to_string(),
            year,
            year2,
            actor: "Keanu Reeves".to_string(),
            title: "Alpha".to_string(),
        }
    }

    #[test]
    fn test_builtin_library_has_twenty_templates() {
        let library = TemplateLibrary::builtin();
        assert_eq!(library.count(), 20);
        assert!(library.template_at(19).is_some());
        assert!(library.template_at(20).is_none());
    }

    #[test]
    fn test_every_template_renders_without_leftovers() {
        let library = TemplateLibrary::builtin();
        let bindings = unfiltered(1999, 2003);
        for template in library.iter() {
            let rendered = template.render(&bindings);
            for name in PLACEHOLDERS {
                assert!(
                    !rendered.contains(&format!("{{{}}}", name)),
                    "leftover {{{}}} in {}",
                    name,
                    rendered
                );
            }
            assert!(rendered.starts_with("MATCH "));
            assert!(rendered.contains("RETURN "));
            assert_eq!(rendered.matches('(').count(), rendered.matches(')').count());
            assert_eq!(rendered.matches('\'').count() % 2, 0);
        }
    }

    #[test]
    fn test_first_template_renders_year_scenario() {
        let library = TemplateLibrary::builtin();
        let rendered = library.template_at(0).unwrap().render(&unfiltered(2000, 2010));
        assert!(rendered.contains(
            "true AND m.released IS NOT NULL AND d.born IS NOT NULL AND m.released > 2000"
        ));
    }

    #[test]
    fn test_unused_bindings_are_ignored() {
        let template = QueryTemplate::parse(0, "MATCH (a:Person) WHERE {actor_clause} RETURN a").unwrap();
        assert_eq!(template.placeholders(), vec!["actor_clause"]);
        assert!(!template.uses("year"));
        assert_eq!(
            template.render(&unfiltered(1, 2)),
            "MATCH (a:Person) WHERE true RETURN a"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let err = TemplateLibrary::from_texts(vec!["MATCH (n) WHERE n.x = {limit} RETURN n"]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder { index: 0, name: "limit".to_string() }
        );
    }

    #[test]
    fn test_map_literals_are_not_placeholders() {
        let template = QueryTemplate::parse(0, "MATCH (m:Movie {title: '{title}'}) RETURN m").unwrap();
        assert_eq!(template.placeholders(), vec!["title"]);
    }

    #[test]
    fn test_library_from_json() {
        let library = TemplateLibrary::from_json_str(r#"["MATCH (a:Person) WHERE {actor_clause} RETURN a"]"#).unwrap();
        assert_eq!(library.count(), 1);
        assert_eq!(TemplateLibrary::from_json_str("[]").unwrap_err(), TemplateError::EmptyLibrary);
        assert!(matches!(TemplateLibrary::from_json_str("{"), Err(TemplateError::Parse(_))));
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(escape_literal("O'Hara"), "O\\'Hara");
        assert_eq!(escape_literal("a\\b"), "a\\\\b");
        assert_eq!(Bindings::equality_clause("a.name", "Tom O'Neil"), "a.name = 'Tom O\\'Neil'");
    }
}
