//! The link pass: resolve every topic link of every page, then write the results back.
//!
//! Resolution runs over a read-only graph, so pages are processed in parallel batches. The
//! changes are collected per page and applied afterwards, one page at a time.

use crate::{
    concurrency::{concurrent_map, BatchConfig, CancellationToken},
    diagnostic::{Diagnostic, DiagnosticNote, Problem},
    error::TopicGraphError,
    graph::{DocumentationGraph, EdgeKind, PathLookup},
    markup::{ast::inlines_plain_text, DocumentationMarkup, Inline},
    node::DocumentationNode,
    reference::{ReferenceInterner, ResolvedTopicReference, UnresolvedTopicReference},
    resolve::resolver::{
        ErrorInfo, LinkResolver, LinkStyle, TopicReferenceResolutionResult,
    },
};

pub const UNRESOLVED_TOPIC: &str = "UnresolvedTopic";

/// What the link pass changes on one page.
#[derive(Debug, Clone)]
pub struct NodeLinkUpdate {
    pub reference: ResolvedTopicReference,
    /// The page's markup with links rewritten.
    pub markup: DocumentationMarkup,
    /// Local pages listed in the page's Topics task groups.
    pub curated: Vec<ResolvedTopicReference>,
    pub problems: Vec<Problem>,
}

/// Resolve the links of `pages`. The result is in the order of `pages`, whatever the
/// parallelism.
#[tracing::instrument(skip_all)]
pub fn resolve_links(
    resolver: &LinkResolver<'_>,
    pages: &[ResolvedTopicReference],
    batching: &BatchConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<NodeLinkUpdate>, TopicGraphError> {
    let updates = concurrent_map(pages, batching, cancel, |page| {
        resolver
            .graph
            .get(page)
            .map(|node| resolve_node_links(resolver, node))
    })?;
    let updates: Vec<NodeLinkUpdate> = updates.into_iter().flatten().collect();
    tracing::debug!(
        "[resolve::resolve_links] resolved links of {} pages, {} problems",
        updates.len(),
        updates.iter().map(|u| u.problems.len()).sum::<usize>()
    );
    Ok(updates)
}

fn authored_destination(inline: &Inline) -> Option<&str> {
    match inline {
        Inline::SymbolLink { destination, .. } => Some(destination),
        Inline::Link { destination, .. } if inline.is_topic_link() => Some(destination),
        _ => None,
    }
}

fn unresolved_problem(
    node: &DocumentationNode,
    inline: &Inline,
    authored: &str,
    info: &ErrorInfo,
) -> Problem {
    let range = inline.range();
    let mut diagnostic = Diagnostic::warning(UNRESOLVED_TOPIC, info.message.clone())
        .with_source(node.source_file(range))
        .with_range(range);
    if let Some(note) = &info.note {
        diagnostic = diagnostic.with_note(DiagnosticNote {
            source: None,
            range: None,
            message: note.clone(),
        });
    }
    tracing::trace!("[resolve::unresolved_problem] {authored} on {}", node.reference);
    Problem::new(diagnostic, info.solutions(range, &LinkStyle::of(inline)))
}

/// Resolve every topic link of one page.
pub fn resolve_node_links(resolver: &LinkResolver<'_>, node: &DocumentationNode) -> NodeLinkUpdate {
    let mut markup = node.markup.clone();
    let mut problems = vec![];
    markup.for_each_content_block_mut(|block| {
        block.visit_inlines_mut(&mut |inline| {
            let Some(authored) = authored_destination(inline).map(str::to_string) else {
                return;
            };
            let result = match UnresolvedTopicReference::parse(&authored) {
                Ok(unresolved) => resolver.resolve(&unresolved, &node.reference),
                Err(err) => TopicReferenceResolutionResult::Failure(
                    UnresolvedTopicReference {
                        bundle_id: None,
                        path: authored.clone(),
                        fragment: None,
                        title: None,
                        authored: authored.clone(),
                    },
                    ErrorInfo::new(err.to_string()),
                ),
            };
            match result {
                TopicReferenceResolutionResult::Success(reference) => match inline {
                    Inline::SymbolLink { destination, .. } | Inline::Link { destination, .. } => {
                        *destination = reference.url().to_string();
                    }
                    _ => {}
                },
                TopicReferenceResolutionResult::Failure(_, info) => {
                    problems.push(unresolved_problem(node, inline, &authored, &info));
                    let title = match inline {
                        Inline::Link { content, .. } => Some(inlines_plain_text(content)),
                        _ => None,
                    };
                    *inline = Inline::Unresolved {
                        authored,
                        title,
                        range: inline.range(),
                    };
                }
            }
        });
    });

    let curated = curated_references(resolver.graph, &markup);
    NodeLinkUpdate {
        reference: node.reference.clone(),
        markup,
        curated,
        problems,
    }
}

/// Local pages named by the (already rewritten) Topics task groups, in order.
fn curated_references(
    graph: &DocumentationGraph,
    markup: &DocumentationMarkup,
) -> Vec<ResolvedTopicReference> {
    let Some(topics) = &markup.topics else {
        return vec![];
    };
    let mut curated = vec![];
    for group in topics.task_groups() {
        for link in group.links() {
            let Ok(parsed) = UnresolvedTopicReference::parse(&link.destination) else {
                continue;
            };
            let Some(bundle_id) = parsed.bundle_id.as_deref() else {
                continue;
            };
            if let PathLookup::Found(reference) = graph.lookup_path(bundle_id, &parsed.path) {
                if !curated.contains(&reference) {
                    curated.push(reference);
                }
            }
        }
    }
    curated
}

/// Write link pass results into the graph. Returns the problems found.
pub fn apply_link_updates(
    graph: &mut DocumentationGraph,
    interner: &ReferenceInterner,
    updates: Vec<NodeLinkUpdate>,
) -> Vec<Problem> {
    let mut problems = vec![];
    for update in updates {
        for curated in update.curated.iter() {
            graph.add_edge(&update.reference, curated, EdgeKind::Curated);
        }
        if let Some(node) = graph.get_mut(&update.reference) {
            node.markup = update.markup;
            node.regenerate_anchor_sections(interner);
        }
        graph.refresh_anchors(&update.reference);
        problems.extend(update.problems);
    }
    problems
}
