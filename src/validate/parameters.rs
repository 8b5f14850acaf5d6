//! Cross-checks documented parameters and returns against a symbol's signatures.
//!
//! Each language variant of a symbol gets its own parameter and return sections, holding only
//! what exists in that variant's signature. Named parameters are matched by name first, then
//! unnamed ones take the remaining documented entries by position.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::{
    config::ResolverConfig,
    diagnostic::{Diagnostic, Problem, Replacement, Solution, SourceRange},
    markup::{
        ast::{blocks_plain_text, Block, BlockKind, Inline},
        Parameter, Return,
    },
    node::{DocumentationNode, VariantSections},
    reference::SourceLanguage,
    resolve::near_misses,
    symbol::FunctionSignature,
};

pub const DUPLICATE_PARAMETER_DOCUMENTATION: &str = "DuplicateParameterDocumentation";
pub const EXTERNAL_PARAMETER_NAME: &str = "ExternalParameterName";
pub const UNKNOWN_PARAMETER: &str = "UnknownParameter";
pub const MISSING_PARAMETER_DOCUMENTATION: &str = "MissingParameterDocumentation";
pub const VOID_RETURN_DOCUMENTED: &str = "VoidReturnDocumented";

const PARAMETER_PLACEHOLDER: &str = "<#parameter description#>";
const ERROR_PARAMETER: &str = "error";
const ERROR_PARAMETER_DESCRIPTION: &str = "On output, a pointer set to an error object on failure.";

/// Prose that already talks about failure.
static DESCRIBES_FAILURE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\b(error|fail|nil|null)\b").ok());

/// The per-variant sections of a symbol and the problems found building them.
#[derive(Debug, Clone, Default)]
pub struct ParameterValidation {
    pub variant_sections: Vec<VariantSections>,
    pub problems: Vec<Problem>,
}

struct Checker<'a> {
    node: &'a DocumentationNode,
    config: &'a ResolverConfig,
    problems: Vec<Problem>,
}

impl Checker<'_> {
    fn warn(&mut self, name: &str, summary: String, range: Option<SourceRange>, solutions: Vec<Solution>) {
        let diagnostic = Diagnostic::warning(name, summary)
            .with_source(self.node.source_file(range))
            .with_range(range);
        self.problems.push(Problem::new(diagnostic, solutions));
    }
}

fn removal(summary: &str, range: Option<SourceRange>) -> Vec<Solution> {
    range
        .map(|range| vec![Solution::new(summary, vec![Replacement::removal(range)])])
        .unwrap_or_default()
}

/// Validate the documented parameters and returns of a symbol page.
///
/// `None` for pages without a symbol or whose symbol has no function signature.
pub fn validate_parameters(
    node: &DocumentationNode,
    config: &ResolverConfig,
) -> Option<ParameterValidation> {
    let symbol = node.symbol.as_ref()?;
    let signatures: Vec<(SourceLanguage, &FunctionSignature)> = symbol.signatures().collect();
    if signatures.is_empty() {
        return None;
    }
    let mut checker = Checker {
        node,
        config,
        problems: vec![],
    };

    let documented = checker.deduplicated(&node.markup.tags.parameters);
    let bridged_error = bridged_error_parameter(&signatures, &documented);

    let mut per_variant: Vec<(SourceLanguage, Vec<Parameter>)> = vec![];
    let mut matched: BTreeSet<usize> = BTreeSet::new();
    for (language, signature) in signatures.iter() {
        let mut variant_documented = documented.clone();
        if *language == SourceLanguage::ObjectiveC {
            variant_documented.extend(bridged_error.clone());
        }
        let slots = match_signature(signature, &variant_documented);
        matched.extend(slots.iter().flatten().filter(|idx| **idx < documented.len()));
        per_variant.push((
            *language,
            slots
                .into_iter()
                .flatten()
                .map(|idx| variant_documented[idx].clone())
                .collect(),
        ));
    }

    let covered_by_external = checker.unmatched(&signatures, &documented, &matched);
    if !documented.is_empty() {
        checker.missing(&signatures, &documented, bridged_error.is_some(), &covered_by_external);
    }
    let returns = checker.returns(&signatures, bridged_error.is_some());

    let variant_sections = per_variant
        .into_iter()
        .zip(returns)
        .map(|((language, parameters), returns)| VariantSections {
            language,
            parameters,
            returns,
        })
        .collect();
    Some(ParameterValidation {
        variant_sections,
        problems: checker.problems,
    })
}

/// The synthesized Objective-C `error` parameter of a throwing Swift function, unless the
/// author documented one.
fn bridged_error_parameter(
    signatures: &[(SourceLanguage, &FunctionSignature)],
    documented: &[Parameter],
) -> Option<Parameter> {
    let signature = |language| {
        signatures
            .iter()
            .find(|(candidate, _)| *candidate == language)
            .map(|(_, signature)| *signature)
    };
    let swift = signature(SourceLanguage::Swift)?;
    let objc = signature(SourceLanguage::ObjectiveC)?;
    let ends_in_error = objc
        .parameters
        .last()
        .and_then(|param| param.internal_name())
        == Some(ERROR_PARAMETER);
    if !swift.is_throwing
        || !ends_in_error
        || documented.iter().any(|param| param.name == ERROR_PARAMETER)
    {
        return None;
    }
    Some(Parameter::new(
        ERROR_PARAMETER,
        vec![Block::paragraph(ERROR_PARAMETER_DESCRIPTION)],
    ))
}

/// Indices into `documented` for each parameter of `signature`, in signature order.
fn match_signature(signature: &FunctionSignature, documented: &[Parameter]) -> Vec<Option<usize>> {
    let mut slots: Vec<Option<usize>> = vec![None; signature.parameters.len()];
    let mut consumed: BTreeSet<usize> = BTreeSet::new();
    for (slot, param) in signature.parameters.iter().enumerate() {
        let Some(name) = param.internal_name() else {
            continue;
        };
        if let Some(idx) = documented
            .iter()
            .position(|doc| doc.name == name)
            .filter(|idx| !consumed.contains(idx))
        {
            slots[slot] = Some(idx);
            consumed.insert(idx);
        }
    }

    let named: BTreeSet<&str> = signature
        .parameters
        .iter()
        .filter_map(|param| param.internal_name())
        .collect();
    let mut remaining = (0..documented.len())
        .filter(|idx| !consumed.contains(idx) && !named.contains(documented[*idx].name.as_str()));
    for (slot, param) in signature.parameters.iter().enumerate() {
        if param.internal_name().is_none() {
            slots[slot] = remaining.next();
        }
    }
    slots
}

impl Checker<'_> {
    /// Keep the first entry for each name.
    fn deduplicated(&mut self, parameters: &[Parameter]) -> Vec<Parameter> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut kept = vec![];
        for param in parameters {
            if seen.insert(param.name.as_str()) {
                kept.push(param.clone());
                continue;
            }
            self.warn(
                DUPLICATE_PARAMETER_DOCUMENTATION,
                format!("Parameter '{}' is already documented", param.name),
                param.range,
                removal("Remove duplicate parameter documentation", param.range),
            );
        }
        kept
    }

    /// Report documented parameters no variant matched. Returns the internal names documented
    /// under their argument label.
    fn unmatched(
        &mut self,
        signatures: &[(SourceLanguage, &FunctionSignature)],
        documented: &[Parameter],
        matched: &BTreeSet<usize>,
    ) -> BTreeSet<String> {
        let mut internal_names: Vec<&str> = vec![];
        for (_, signature) in signatures {
            for name in signature.parameters.iter().filter_map(|param| param.internal_name()) {
                if !internal_names.contains(&name) {
                    internal_names.push(name);
                }
            }
        }
        let mut covered = BTreeSet::new();
        for (idx, param) in documented.iter().enumerate() {
            if matched.contains(&idx) {
                continue;
            }
            let labelled = signatures
                .iter()
                .flat_map(|(_, signature)| signature.parameters.iter())
                .find(|candidate| {
                    candidate.external_name.as_deref() == Some(param.name.as_str())
                        && candidate.internal_name().is_some()
                });
            if let Some(internal) = labelled.and_then(|candidate| candidate.internal_name()) {
                covered.insert(internal.to_string());
                let range = param.name_range.or(param.range);
                let solutions = param
                    .name_range
                    .map(|range| {
                        vec![Solution::new(
                            format!("Replace '{}' with '{internal}'", param.name),
                            vec![Replacement::new(range, internal)],
                        )]
                    })
                    .unwrap_or_default();
                self.warn(
                    EXTERNAL_PARAMETER_NAME,
                    format!(
                        "External name '{}' used to document parameter '{internal}'",
                        param.name
                    ),
                    range,
                    solutions,
                );
                continue;
            }

            let mut solutions = vec![];
            if let Some(name_range) = param.name_range {
                solutions.extend(
                    near_misses(
                        &param.name,
                        &internal_names,
                        self.config.near_miss_limit,
                        self.config.near_miss_threshold,
                    )
                    .into_iter()
                    .map(|candidate| {
                        Solution::new(
                            format!("Replace '{}' with '{candidate}'", param.name),
                            vec![Replacement::new(name_range, candidate)],
                        )
                    }),
                );
            }
            solutions.extend(removal(
                &format!("Remove '{}' parameter documentation", param.name),
                param.range,
            ));
            self.warn(
                UNKNOWN_PARAMETER,
                format!(
                    "Parameter '{}' not found in {} declaration",
                    param.name,
                    self.node.title()
                ),
                param.range,
                solutions,
            );
        }
        covered
    }

    /// Report named parameters of any variant that nothing documents.
    fn missing(
        &mut self,
        signatures: &[(SourceLanguage, &FunctionSignature)],
        documented: &[Parameter],
        error_is_bridged: bool,
        covered: &BTreeSet<String>,
    ) {
        // The longest signature orders insertions; ties go to the earlier variant.
        let Some((_, reference)) = signatures.iter().fold(None, |longest: Option<&(SourceLanguage, &FunctionSignature)>, candidate| {
            match longest {
                Some((_, signature)) if signature.parameters.len() >= candidate.1.parameters.len() => {
                    longest
                }
                _ => Some(candidate),
            }
        }) else {
            return;
        };
        let is_documented = |name: &str| {
            documented.iter().any(|param| param.name == name)
                || covered.contains(name)
                || (error_is_bridged && name == ERROR_PARAMETER)
        };
        let mut reported: BTreeSet<&str> = BTreeSet::new();
        for (_, signature) in signatures {
            for name in signature.parameters.iter().filter_map(|param| param.internal_name()) {
                if is_documented(name) || !reported.insert(name) {
                    continue;
                }
                let solutions = insertion(reference, documented, name)
                    .map(|replacement| {
                        vec![Solution::new(
                            format!("Document '{name}' parameter"),
                            vec![replacement],
                        )]
                    })
                    .unwrap_or_default();
                let range = documented.first().and_then(|param| param.range);
                self.warn(
                    MISSING_PARAMETER_DOCUMENTATION,
                    format!("Parameter '{name}' is missing documentation"),
                    range,
                    solutions,
                );
            }
        }
    }

    /// Returns per variant, in signature order.
    fn returns(
        &mut self,
        signatures: &[(SourceLanguage, &FunctionSignature)],
        error_is_bridged: bool,
    ) -> Vec<Vec<Return>> {
        let documented = &self.node.markup.tags.returns;
        if !documented.is_empty() && signatures.iter().all(|(_, signature)| signature.returns_void()) {
            let range = documented.first().and_then(|ret| ret.range);
            let replacements: Vec<Replacement> = documented
                .iter()
                .filter_map(|ret| ret.range.map(Replacement::removal))
                .collect();
            let solutions = if replacements.is_empty() {
                vec![]
            } else {
                vec![Solution::new("Remove return value documentation", replacements)]
            };
            self.warn(
                VOID_RETURN_DOCUMENTED,
                format!(
                    "Return value documented for {} which doesn't return a value",
                    self.node.title()
                ),
                range,
                solutions,
            );
            return vec![vec![]; signatures.len()];
        }

        signatures
            .iter()
            .map(|(language, signature)| {
                let is_bridged = error_is_bridged && *language == SourceLanguage::ObjectiveC;
                if signature.returns_void() && !is_bridged {
                    return vec![];
                }
                let mut returns = documented.clone();
                if is_bridged {
                    append_failure_description(&mut returns, signature);
                }
                returns
            })
            .collect()
    }
}

fn parameter_line(name: &str, standalone: bool) -> String {
    if standalone {
        format!("- Parameter {name}: {PARAMETER_PLACEHOLDER}")
    } else {
        format!("- {name}: {PARAMETER_PLACEHOLDER}")
    }
}

/// Where documentation for `name` goes: before the documented parameter that follows it in
/// `reference`, or after the last documented parameter.
fn insertion(
    reference: &FunctionSignature,
    documented: &[Parameter],
    name: &str,
) -> Option<Replacement> {
    let position = reference
        .parameters
        .iter()
        .position(|param| param.internal_name() == Some(name));
    let following = position.and_then(|position| {
        reference.parameters[position + 1..]
            .iter()
            .filter_map(|param| param.internal_name())
            .find_map(|next| documented.iter().find(|doc| doc.name == next))
    });
    if let Some(next) = following {
        let range = next.range?;
        let indent = " ".repeat(range.start.column.saturating_sub(1));
        return Some(Replacement::new(
            SourceRange::empty_at(range.start),
            format!("{}\n{indent}", parameter_line(name, next.is_standalone)),
        ));
    }
    let last = documented.last()?;
    let range = last.range?;
    let indent = " ".repeat(range.start.column.saturating_sub(1));
    Some(Replacement::new(
        SourceRange::empty_at(range.end),
        format!("\n{indent}{}", parameter_line(name, last.is_standalone)),
    ))
}

/// Tell the Objective-C reader what a bridged throwing method returns on failure.
fn append_failure_description(returns: &mut Vec<Return>, signature: &FunctionSignature) {
    let prose: String = returns
        .iter()
        .map(|ret| blocks_plain_text(&ret.contents))
        .collect::<Vec<_>>()
        .join(" ");
    if DESCRIBES_FAILURE
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&prose))
    {
        return;
    }
    let failure_value = match signature.returns.as_deref().map(str::trim) {
        Some("BOOL") => "NO",
        _ => "nil",
    };
    let sentence = vec![
        Inline::text("On failure, this method returns "),
        Inline::Code(failure_value.to_string()),
        Inline::text("."),
    ];
    match returns.last_mut().and_then(|ret| ret.contents.last_mut()) {
        Some(Block {
            kind: BlockKind::Paragraph(inlines),
            ..
        }) => {
            inlines.push(Inline::text(" "));
            inlines.extend(sentence);
        }
        Some(_) | None => {
            let block = Block::new(BlockKind::Paragraph(sentence), None);
            match returns.last_mut() {
                Some(ret) => ret.contents.push(block),
                None => returns.push(Return {
                    contents: vec![block],
                    range: None,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reference::ReferenceInterner,
        symbol::{DeclarationKind, DocComment, SignatureParameter, Symbol, SymbolVariant},
    };

    fn node_with(doc: &str, variants: Vec<(SourceLanguage, FunctionSignature)>) -> DocumentationNode {
        let interner = ReferenceInterner::new();
        let languages = variants.iter().map(|(language, _)| *language).collect();
        let reference = interner.resolve("b", "/documentation/Kit/run(_:)", None, languages);
        let symbol = Symbol {
            precise_id: "s:3Kit3runyy".to_string(),
            kind: DeclarationKind::new("swift.func", "Function"),
            title: "run(_:)".to_string(),
            path_components: vec!["run(_:)".to_string()],
            availability: vec![],
            variants: variants
                .into_iter()
                .map(|(language, signature)| SymbolVariant {
                    language,
                    signature: Some(signature),
                    declaration: None,
                })
                .collect(),
            doc_comment: Some(DocComment::from_text(doc)),
        };
        DocumentationNode::from_symbol(reference, symbol, None, None, &interner)
    }

    fn signature(parameters: Vec<SignatureParameter>, returns: Option<&str>) -> FunctionSignature {
        FunctionSignature {
            parameters,
            returns: returns.map(str::to_string),
            is_throwing: false,
        }
    }

    fn names(parameters: &[Parameter]) -> Vec<&str> {
        parameters.iter().map(|param| param.name.as_str()).collect()
    }

    fn validate(node: &DocumentationNode) -> ParameterValidation {
        validate_parameters(node, &ResolverConfig::default()).unwrap()
    }

    #[test]
    fn test_unnamed_parameters_match_by_position() {
        let node = node_with(
            "Runs.\n\n- Parameter a: First.\n- Parameter b: Second.\n- Parameter c: Third.",
            vec![(
                SourceLanguage::C,
                signature(
                    vec![
                        SignatureParameter::named("a"),
                        SignatureParameter::unnamed(),
                        SignatureParameter::named("c"),
                    ],
                    Some("int"),
                ),
            )],
        );
        let result = validate(&node);
        assert!(result.problems.is_empty(), "{:?}", result.problems);
        assert_eq!(names(&result.variant_sections[0].parameters), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_void_return_documented_once() {
        let node = node_with(
            "Runs.\n\n- Returns: Something.",
            vec![
                (SourceLanguage::Swift, signature(vec![], Some("Void"))),
                (SourceLanguage::ObjectiveC, signature(vec![], Some("void"))),
            ],
        );
        let result = validate(&node);
        let warnings: Vec<_> = result
            .problems
            .iter()
            .filter(|problem| problem.is(VOID_RETURN_DOCUMENTED))
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(result.problems.len(), 1);
        let solution = &warnings[0].possible_solutions[0];
        assert_eq!(solution.replacements.len(), 1);
        assert_eq!(solution.replacements[0].replacement, "");
        assert!(result
            .variant_sections
            .iter()
            .all(|sections| sections.returns.is_empty()));
    }

    #[test]
    fn test_unknown_duplicate_and_external_names() {
        let node = node_with(
            "Runs.\n\n- Parameters:\n  - count: How many.\n  - count: Again.\n  - with: Labelled.\n  - cuont: Typo.",
            vec![(
                SourceLanguage::Swift,
                signature(
                    vec![
                        SignatureParameter::named("count"),
                        SignatureParameter::named("value").with_external_name("with"),
                    ],
                    None,
                ),
            )],
        );
        let result = validate(&node);
        let ids: Vec<&str> = result.problems.iter().map(Problem::identifier).collect();
        assert_eq!(
            ids,
            vec![
                "org.topicgraph.DuplicateParameterDocumentation",
                "org.topicgraph.ExternalParameterName",
                "org.topicgraph.UnknownParameter",
            ]
        );
        let unknown = &result.problems[2];
        assert_eq!(
            unknown.possible_solutions[0].replacements[0].replacement,
            "count"
        );
        assert_eq!(
            unknown.possible_solutions.last().unwrap().replacements[0].replacement,
            ""
        );
        assert_eq!(names(&result.variant_sections[0].parameters), vec!["count"]);
    }

    #[test]
    fn test_missing_parameter_insertion() {
        let node = node_with(
            "Runs.\n\n- Parameter first: One.\n- Parameter third: Three.",
            vec![(
                SourceLanguage::Swift,
                signature(
                    vec![
                        SignatureParameter::named("first"),
                        SignatureParameter::named("second"),
                        SignatureParameter::named("third"),
                    ],
                    None,
                ),
            )],
        );
        let result = validate(&node);
        assert_eq!(result.problems.len(), 1);
        assert!(result.problems[0].is(MISSING_PARAMETER_DOCUMENTATION));
        let replacement = &result.problems[0].possible_solutions[0].replacements[0];
        assert_eq!(
            replacement.replacement,
            "- Parameter second: <#parameter description#>\n"
        );
        let third = &node.markup.tags.parameters[1];
        assert_eq!(replacement.range.start, third.range.unwrap().start);
    }

    #[test]
    fn test_insertion_follows_the_first_of_equally_long_signatures() {
        let params = |names: [&str; 3]| {
            names.into_iter().map(SignatureParameter::named).collect::<Vec<_>>()
        };
        let node = node_with(
            "Runs.\n\n- Parameter first: One.\n- Parameter third: Three.",
            vec![
                (SourceLanguage::Swift, signature(params(["first", "second", "third"]), None)),
                (SourceLanguage::ObjectiveC, signature(params(["first", "third", "second"]), None)),
            ],
        );
        let result = validate(&node);
        assert_eq!(result.problems.len(), 1, "{:?}", result.problems);
        let replacement = &result.problems[0].possible_solutions[0].replacements[0];
        let third = &node.markup.tags.parameters[1];
        assert_eq!(replacement.range.start, third.range.unwrap().start);
    }

    #[test]
    fn test_undocumented_symbol_has_no_missing_warnings() {
        let node = node_with(
            "Runs.",
            vec![(
                SourceLanguage::Swift,
                signature(vec![SignatureParameter::named("first")], None),
            )],
        );
        assert!(validate(&node).problems.is_empty());
    }

    #[test]
    fn test_throwing_function_bridges_error_parameter() {
        let mut swift = signature(vec![SignatureParameter::named("path")], Some("Data"));
        swift.is_throwing = true;
        let objc = signature(
            vec![SignatureParameter::named("path"), SignatureParameter::named("error")],
            Some("NSData *"),
        );
        let node = node_with(
            "Loads.\n\n- Parameter path: The path.\n- Returns: The contents.",
            vec![(SourceLanguage::Swift, swift), (SourceLanguage::ObjectiveC, objc)],
        );
        let result = validate(&node);
        assert!(result.problems.is_empty(), "{:?}", result.problems);

        let swift_sections = &result.variant_sections[0];
        assert_eq!(names(&swift_sections.parameters), vec!["path"]);
        assert_eq!(
            blocks_plain_text(&swift_sections.returns[0].contents),
            "The contents."
        );
        let objc_sections = &result.variant_sections[1];
        assert_eq!(names(&objc_sections.parameters), vec!["path", "error"]);
        assert_eq!(
            blocks_plain_text(&objc_sections.returns[0].contents),
            "The contents. On failure, this method returns nil."
        );
    }

    #[test]
    fn test_failure_wording_respects_author_prose() {
        let mut swift = signature(vec![], Some("Bool"));
        swift.is_throwing = true;
        let objc = signature(vec![SignatureParameter::named("error")], Some("BOOL"));
        let bridged = |doc: &str| {
            let node = node_with(
                doc,
                vec![(SourceLanguage::Swift, swift.clone()), (SourceLanguage::ObjectiveC, objc.clone())],
            );
            let result = validate(&node);
            blocks_plain_text(&result.variant_sections[1].returns[0].contents)
        };
        assert_eq!(
            bridged("Saves.\n\n- Returns: Whether it saved."),
            "Whether it saved. On failure, this method returns NO."
        );
        assert_eq!(
            bridged("Saves.\n\n- Returns: `NO` if an error occurred."),
            "NO if an error occurred."
        );
    }
}
