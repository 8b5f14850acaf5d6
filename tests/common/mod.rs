use std::{fs, path::Path};
use tempfile::TempDir;
use topicgraph::{
    concurrency::BatchConfig,
    config::ConvertConfig,
    diagnostic::SourceLocation,
    reference::SourceLanguage,
    symbol::{
        Article, DeclarationKind, DocComment, InMemoryProvider, ModuleSymbols, Symbol,
        SymbolVariant,
    },
    TopicGraphError,
};

/// Initialize logging for tests
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub fn sequential_config() -> ConvertConfig {
    ConvertConfig {
        batching: BatchConfig::sequential(),
        ..Default::default()
    }
}

/// A Swift symbol whose doc comment sits in `Sources/<module>/<name>.swift`, starting at `start`.
#[allow(dead_code)]
pub fn located_symbol(
    module: &str,
    precise_id: &str,
    kind: &str,
    path: &[&str],
    doc: &str,
    start: SourceLocation,
) -> Symbol {
    let name = path.last().copied().unwrap_or_default();
    Symbol {
        precise_id: precise_id.to_string(),
        kind: DeclarationKind::new(kind, kind),
        title: name.to_string(),
        path_components: path.iter().map(|component| component.to_string()).collect(),
        availability: vec![],
        variants: vec![SymbolVariant {
            language: SourceLanguage::Swift,
            signature: None,
            declaration: Some(format!("{kind} {name}")),
        }],
        doc_comment: Some(DocComment::located(
            doc,
            format!("Sources/{module}/{name}.swift"),
            start,
        )),
    }
}

/// Lay a bundle out on disk the way a catalog is shipped: one `symbols.json` holding every
/// module, plus one markdown file per article.
#[allow(dead_code)]
pub fn write_catalog(
    modules: &[ModuleSymbols],
    articles: &[(&str, &str)],
) -> Result<TempDir, TopicGraphError> {
    let temp_dir = TempDir::new()?;
    let symbols = serde_json::to_string_pretty(modules)?;
    fs::write(temp_dir.path().join("symbols.json"), symbols)?;
    for (name, text) in articles {
        fs::write(temp_dir.path().join(format!("{name}.md")), text)?;
    }
    Ok(temp_dir)
}

/// Read a catalog written by [`write_catalog`] back into a provider.
#[allow(dead_code)]
pub fn read_catalog(bundle_id: &str, root: &Path) -> Result<InMemoryProvider, TopicGraphError> {
    let symbols = fs::read_to_string(root.join("symbols.json"))?;
    let mut provider = InMemoryProvider::new(bundle_id).with_modules_json(&symbols)?;
    let mut markdown: Vec<_> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    markdown.sort();
    for path in markdown {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = fs::read_to_string(&path)?;
        provider = provider.with_article(Article::parse(name, &text, Some(path)));
    }
    Ok(provider)
}
