//! The graph construction session.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::{
    concurrency::{concurrent_map, CancellationToken},
    config::ConvertConfig,
    diagnostic::{Diagnostic, DiagnosticConsumer, DiagnosticEngine, Problem},
    error::TopicGraphError,
    graph::{
        base::disambiguation_hash, curation::apply_automatic_curation, DocumentationGraph,
        EdgeKind, PathLookup,
    },
    node::{DocumentationKind, DocumentationNode},
    paths::{canonical_topic_path, TopicPath, DOCUMENTATION_ROOT},
    reference::{ReferenceInterner, ResolvedTopicReference, SourceLanguageSet},
    resolve::{
        external::{ExternalArchive, OutOfProcessResolver},
        pass::{apply_link_updates, resolve_links},
        resolver::{LinkResolver, TopicReferenceResolutionResult},
    },
    symbol::{Article, DocumentationProvider, ModuleSymbols, Symbol},
    validate::parameters::validate_parameters,
};

/// The output collaborator: receives every finished page.
pub trait RenderConsumer: Send + Sync {
    fn consume(&self, node: &DocumentationNode) -> Result<(), TopicGraphError>;
}

/// Counts of what one [`DocumentationContext::register`] call added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub bundle_id: String,
    pub modules: usize,
    pub symbols: usize,
    pub articles: usize,
    pub problems: usize,
}

/// One graph construction session.
///
/// The context owns everything a build creates: the reference interner, the graph, and the
/// collected diagnostics. Dropping the context ends the session.
pub struct DocumentationContext {
    config: ConvertConfig,
    interner: ReferenceInterner,
    graph: DocumentationGraph,
    diagnostics: DiagnosticEngine,
    externals: Vec<Arc<dyn ExternalArchive>>,
    out_of_process: Option<Arc<dyn OutOfProcessResolver>>,
    cancellation: CancellationToken,
    bundles: BTreeSet<String>,
}

impl std::fmt::Debug for DocumentationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentationContext")
            .field("bundles", &self.bundles)
            .field("nodes", &self.graph.len())
            .field("externals", &self.externals.len())
            .field("out_of_process", &self.out_of_process.is_some())
            .finish()
    }
}

/// A symbol placed in the graph, before its node is built.
struct PlacedSymbol<'a> {
    reference: ResolvedTopicReference,
    base_path: String,
    symbol: &'a Symbol,
    extension: Option<&'a Article>,
}

impl DocumentationContext {
    pub fn new(config: ConvertConfig) -> Self {
        DocumentationContext {
            diagnostics: DiagnosticEngine::new(config.diagnostics.clone()),
            config,
            interner: ReferenceInterner::new(),
            graph: DocumentationGraph::new(),
            externals: vec![],
            out_of_process: None,
            cancellation: CancellationToken::new(),
            bundles: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn graph(&self) -> &DocumentationGraph {
        &self.graph
    }

    pub fn interner(&self) -> &ReferenceInterner {
        &self.interner
    }

    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.diagnostics.problems()
    }

    pub fn bundle_ids(&self) -> Vec<String> {
        self.bundles.iter().cloned().collect()
    }

    /// A token that stops running and future bulk passes of this session when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn add_diagnostic_consumer(&self, consumer: Arc<dyn DiagnosticConsumer>) {
        self.diagnostics.add_consumer(consumer);
    }

    /// Archives are consulted in the order they were added.
    pub fn add_external_archive(&mut self, archive: Arc<dyn ExternalArchive>) {
        tracing::debug!(
            "[DocumentationContext::add_external_archive] {}",
            archive.bundle_id()
        );
        self.externals.push(archive);
    }

    pub fn set_out_of_process_resolver(&mut self, resolver: Arc<dyn OutOfProcessResolver>) {
        self.out_of_process = Some(resolver);
    }

    fn default_languages(&self) -> SourceLanguageSet {
        self.config.default_language.into()
    }

    pub fn resolver(&self) -> LinkResolver<'_> {
        LinkResolver {
            graph: &self.graph,
            interner: &self.interner,
            config: &self.config.resolver,
            externals: &self.externals,
            out_of_process: self.out_of_process.as_deref(),
            default_languages: self.default_languages(),
        }
    }

    /// Resolve a single reference authored on `parent`.
    pub fn resolve(
        &self,
        unresolved: &crate::reference::UnresolvedTopicReference,
        parent: &ResolvedTopicReference,
    ) -> TopicReferenceResolutionResult {
        self.resolver().resolve(unresolved, parent)
    }

    fn check_cancelled(&self) -> Result<(), TopicGraphError> {
        if self.cancellation.is_cancelled() {
            Err(TopicGraphError::OperationCancelled)
        } else {
            Ok(())
        }
    }

    /// Build the pages of one bundle, resolve their links, curate, and validate them.
    ///
    /// Registering a bundle id that is already registered replaces it. Content problems end up
    /// in [`DocumentationContext::problems`]; only provider failures and cancellation are
    /// errors.
    #[tracing::instrument(skip_all)]
    pub fn register(
        &mut self,
        provider: &dyn DocumentationProvider,
    ) -> Result<RegistrationSummary, TopicGraphError> {
        let bundle_id = provider.bundle_id().to_string();
        if self.bundles.contains(&bundle_id) {
            self.unregister_bundle(&bundle_id);
        }
        let modules = provider.modules()?;
        let articles = provider.articles()?;
        self.check_cancelled()?;
        tracing::info!(
            "[DocumentationContext::register] {bundle_id}: {} modules, {} articles",
            modules.len(),
            articles.len()
        );

        let mut summary = RegistrationSummary {
            bundle_id: bundle_id.clone(),
            modules: modules.len(),
            ..Default::default()
        };
        let mut problems = vec![];
        let (extensions, conceptual): (Vec<&Article>, Vec<&Article>) = articles
            .iter()
            .partition(|article| article.extended_symbol().is_some());
        let mut used_extensions: BTreeSet<usize> = BTreeSet::new();

        for module in modules.iter() {
            summary.symbols +=
                self.add_module(&bundle_id, module, &extensions, &mut used_extensions)?;
        }
        self.bundles.insert(bundle_id.clone());

        for (idx, extension) in extensions.iter().enumerate() {
            if used_extensions.contains(&idx) {
                continue;
            }
            let target = extension.extended_symbol().unwrap_or_default();
            problems.push(Problem::new(
                Diagnostic::warning(
                    "SymbolNotFound",
                    format!(
                        "No symbol matched '{target}' of documentation extension '{}'",
                        extension.name
                    ),
                )
                .with_source(extension.document.source.clone())
                .with_range(extension.blocks().first().and_then(|block| block.range)),
                vec![],
            ));
        }

        let root_module = modules
            .first()
            .map(|module| module.module_name.clone())
            .unwrap_or_else(|| bundle_id.clone());
        let root = self.interner.resolve(
            &bundle_id,
            &format!("{DOCUMENTATION_ROOT}/{root_module}"),
            None,
            self.default_languages(),
        );
        for article in conceptual {
            let reference = self.interner.resolve(
                &bundle_id,
                &format!("{DOCUMENTATION_ROOT}/{root_module}/{}", article.name),
                None,
                self.default_languages(),
            );
            let node = DocumentationNode::from_article(reference.clone(), article, &self.interner);
            if self.graph.insert(node).is_some() {
                tracing::warn!(
                    "[DocumentationContext::register] article {} replaced an existing page",
                    reference
                );
            }
            if self.graph.contains(&root) {
                self.graph.add_edge(&root, &reference, EdgeKind::Child);
            }
            summary.articles += 1;
        }
        self.check_cancelled()?;

        let pages: Vec<ResolvedTopicReference> = self
            .graph
            .references()
            .into_iter()
            .filter(|reference| reference.bundle_id() == bundle_id)
            .collect();
        let updates = resolve_links(
            &self.resolver(),
            &pages,
            &self.config.batching,
            Some(&self.cancellation),
        )?;
        problems.extend(apply_link_updates(&mut self.graph, &self.interner, updates));

        for page in pages.iter() {
            let Some(node) = self.graph.get(page) else {
                continue;
            };
            let source = node.chunks.last().and_then(|chunk| chunk.source.file().cloned());
            if let Some(topics) = &node.markup.topics {
                for group in topics.task_groups() {
                    problems.extend(group.validate(source.as_deref()));
                }
            }
            if let Some(see_also) = &node.markup.see_also {
                problems.extend(see_also.task_group().validate(source.as_deref()));
            }
        }
        apply_automatic_curation(&mut self.graph, &bundle_id);
        self.check_cancelled()?;

        problems.extend(self.validate_parameters(&pages)?);
        summary.problems = problems.len();
        self.diagnostics.emit_all(problems);
        tracing::info!(
            "[DocumentationContext::register] {bundle_id}: {} symbols, {} articles, {} problems",
            summary.symbols,
            summary.articles,
            summary.problems
        );
        Ok(summary)
    }

    /// Add a module page and the nodes of its symbols. Returns the number of symbols added.
    fn add_module(
        &mut self,
        bundle_id: &str,
        module: &ModuleSymbols,
        extensions: &[&Article],
        used_extensions: &mut BTreeSet<usize>,
    ) -> Result<usize, TopicGraphError> {
        let module_path = format!("{DOCUMENTATION_ROOT}/{}", module.module_name);
        let mut module_languages: SourceLanguageSet = module
            .symbols
            .iter()
            .flat_map(|symbol| symbol.languages())
            .collect();
        if module_languages.is_empty() {
            module_languages = self.default_languages();
        }
        let module_ref = self
            .interner
            .resolve(bundle_id, &module_path, None, module_languages);
        let module_extension = find_extension(extensions, &module.module_name, &module_path);
        if let Some((idx, _)) = module_extension {
            used_extensions.insert(idx);
        }
        let module_node = DocumentationNode::module(
            module_ref.clone(),
            &module.module_name,
            module_extension.map(|(_, article)| article),
            &self.interner,
        );
        self.graph.insert(module_node);

        let placed =
            self.place_symbols(bundle_id, module, &module_path, extensions, used_extensions);
        let target_platform = self.config.target_platform.as_deref();
        let interner = &self.interner;
        let nodes = concurrent_map(
            &placed,
            &self.config.batching,
            Some(&self.cancellation),
            |placed| {
                DocumentationNode::from_symbol(
                    placed.reference.clone(),
                    placed.symbol.clone(),
                    placed.extension,
                    target_platform,
                    interner,
                )
            },
        )?;

        let mut by_base_path: BTreeMap<String, ResolvedTopicReference> = BTreeMap::new();
        for (placed, node) in placed.iter().zip(nodes) {
            let kind = node.kind;
            self.graph.insert(node);
            self.graph.add_symbol_aliases(
                &placed.base_path,
                kind,
                &placed.symbol.precise_id,
                &placed.reference,
            );
            by_base_path
                .entry(placed.base_path.clone())
                .or_insert_with(|| placed.reference.clone());
        }
        for placed in placed.iter() {
            let parent_path = TopicPath::new(&placed.base_path).parent().to_string();
            let parent = by_base_path
                .get(&parent_path)
                .cloned()
                .unwrap_or_else(|| module_ref.clone());
            self.graph.add_edge(&parent, &placed.reference, EdgeKind::Child);
        }
        Ok(placed.len())
    }

    /// Choose the final path of every symbol of `module`.
    ///
    /// Symbols sharing a path are told apart by kind when their kinds differ, and by a hash of
    /// their precise identifier when they don't.
    fn place_symbols<'a>(
        &self,
        bundle_id: &str,
        module: &'a ModuleSymbols,
        module_path: &str,
        extensions: &[&'a Article],
        used_extensions: &mut BTreeSet<usize>,
    ) -> Vec<PlacedSymbol<'a>> {
        let mut by_path: BTreeMap<String, Vec<&'a Symbol>> = BTreeMap::new();
        for symbol in module.symbols.iter() {
            let base_path = canonical_topic_path(&format!(
                "{module_path}/{}",
                symbol.path_components.join("/")
            ));
            by_path.entry(base_path).or_default().push(symbol);
        }

        let mut placed = vec![];
        for (base_path, symbols) in by_path {
            let kinds: Vec<DocumentationKind> = symbols
                .iter()
                .map(|symbol| DocumentationKind::from_symbol_kind(&symbol.kind.identifier))
                .collect();
            for (symbol, kind) in symbols.iter().zip(kinds.iter()) {
                let path = if symbols.len() == 1 {
                    base_path.clone()
                } else if kinds.iter().filter(|other| *other == kind).count() == 1 {
                    format!("{base_path}-{}", kind.id())
                } else {
                    format!("{base_path}-{}", disambiguation_hash(&symbol.precise_id))
                };
                let mut languages: SourceLanguageSet = symbol.languages().into_iter().collect();
                if languages.is_empty() {
                    languages = self.default_languages();
                }
                let reference = self.interner.resolve(bundle_id, &path, None, languages);
                let extension = find_extension(extensions, &module.module_name, &path)
                    .or_else(|| find_extension(extensions, &module.module_name, &base_path));
                if let Some((idx, _)) = extension {
                    used_extensions.insert(idx);
                }
                placed.push(PlacedSymbol {
                    reference,
                    base_path: base_path.clone(),
                    symbol,
                    extension: extension.map(|(_, article)| article),
                });
            }
        }
        placed
    }

    /// Check documented parameters and returns of every symbol page against its signatures.
    #[tracing::instrument(skip_all)]
    fn validate_parameters(
        &mut self,
        pages: &[ResolvedTopicReference],
    ) -> Result<Vec<Problem>, TopicGraphError> {
        let graph = &self.graph;
        let resolver_config = &self.config.resolver;
        let results = concurrent_map(
            pages,
            &self.config.batching,
            Some(&self.cancellation),
            |page| {
                graph
                    .get(page)
                    .and_then(|node| validate_parameters(node, resolver_config))
            },
        )?;
        let mut problems = vec![];
        for (page, result) in pages.iter().zip(results) {
            let Some(result) = result else {
                continue;
            };
            if let Some(node) = self.graph.get_mut(page) {
                node.variant_sections = result.variant_sections;
            }
            problems.extend(result.problems);
        }
        Ok(problems)
    }

    /// Remove a bundle's pages and release its interned references. Returns the number of
    /// removed pages.
    pub fn unregister_bundle(&mut self, bundle_id: &str) -> usize {
        let removed = self.graph.remove_bundle(bundle_id);
        self.interner.purge_bundle(bundle_id);
        self.bundles.remove(bundle_id);
        tracing::info!("[DocumentationContext::unregister_bundle] {bundle_id}: {removed} pages");
        removed
    }

    /// Hand every page to `consumer`, in reference order. Returns the number of pages.
    #[tracing::instrument(skip_all)]
    pub fn emit(&self, consumer: &dyn RenderConsumer) -> Result<usize, TopicGraphError> {
        let pages = self.graph.references();
        let graph = &self.graph;
        let results = concurrent_map(
            &pages,
            &self.config.batching,
            Some(&self.cancellation),
            |page| match graph.get(page) {
                Some(node) => consumer.consume(node),
                None => Ok(()),
            },
        )?;
        results.into_iter().collect::<Result<Vec<()>, TopicGraphError>>()?;
        self.diagnostics.finalize();
        Ok(pages.len())
    }

    /// Look up a page by `doc://` URL or absolute path in any registered bundle.
    pub fn node(&self, url_or_path: &str) -> Option<&DocumentationNode> {
        let parsed = crate::reference::UnresolvedTopicReference::parse(url_or_path).ok()?;
        let bundles: Vec<String> = match parsed.bundle_id {
            Some(bundle) => vec![bundle],
            None => self.bundle_ids(),
        };
        bundles
            .iter()
            .find_map(|bundle| match self.graph.lookup_path(bundle, &parsed.path) {
                PathLookup::Found(reference) => self.graph.get(&reference),
                _ => None,
            })
    }
}

/// The extension whose title link names `path` (absolute, module relative, or
/// `Module/...`).
fn find_extension<'a>(
    extensions: &[&'a Article],
    module_name: &str,
    path: &str,
) -> Option<(usize, &'a Article)> {
    let wanted = canonical_topic_path(path);
    extensions.iter().enumerate().find_map(|(idx, article)| {
        let target = article.extended_symbol()?.trim_matches('/');
        let candidates = [
            canonical_topic_path(&format!("{DOCUMENTATION_ROOT}/{target}")),
            canonical_topic_path(&format!("{DOCUMENTATION_ROOT}/{module_name}/{target}")),
            canonical_topic_path(target),
        ];
        candidates.contains(&wanted).then_some((idx, *article))
    })
}
