//! Performance benchmarks for bundle registration and link resolution
//!
//! A generated bundle of `TYPES` types, each with `MEMBERS` members whose doc comments link to
//! siblings, neighbours and a few missing pages, is used to measure:
//! - Full registration (placement, link pass, curation, validation)
//! - The link pass alone, sequential against parallel
//!
//! Run with: cargo bench --bench link_resolution

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use topicgraph::{
    concurrency::{BatchConfig, Parallelism},
    config::ConvertConfig,
    graph::DocumentationContext,
    reference::SourceLanguage,
    resolve::resolve_links,
    symbol::{DeclarationKind, DocComment, InMemoryProvider, Symbol, SymbolVariant},
};

const TYPES: usize = 60;
const MEMBERS: usize = 12;

fn symbol(precise_id: String, kind: &str, path: Vec<String>, doc: String) -> Symbol {
    Symbol {
        precise_id,
        kind: DeclarationKind::new(kind, kind),
        title: path.last().cloned().unwrap_or_default(),
        path_components: path,
        availability: vec![],
        variants: vec![SymbolVariant {
            language: SourceLanguage::Swift,
            signature: None,
            declaration: None,
        }],
        doc_comment: Some(DocComment::from_text(&doc)),
    }
}

fn generated_bundle() -> InMemoryProvider {
    let mut symbols = Vec::with_capacity(TYPES * (MEMBERS + 1));
    for t in 0..TYPES {
        let name = format!("Type{t}");
        let next = format!("Type{}", (t + 1) % TYPES);
        let topics: Vec<String> = (0..MEMBERS / 2)
            .map(|m| format!("- ``member{m}()``"))
            .collect();
        symbols.push(symbol(
            format!("s:5Bench{t}C"),
            "swift.class",
            vec![name.clone()],
            format!(
                "The type number {t}.\n\nSee ``{next}`` and <doc:Missing{t}>.\n\n## Topics\n\n### Basics\n\n{}",
                topics.join("\n")
            ),
        ));
        for m in 0..MEMBERS {
            symbols.push(symbol(
                format!("s:5Bench{t}C6member{m}yyF"),
                "swift.method",
                vec![name.clone(), format!("member{m}()")],
                format!(
                    "Member {m}.\n\nCalls ``member{}()`` on ``{next}/member{m}()``.",
                    (m + 1) % MEMBERS
                ),
            ));
        }
    }
    InMemoryProvider::new("com.example.bench").with_module("Bench", symbols)
}

fn config(batching: BatchConfig) -> ConvertConfig {
    ConvertConfig {
        batching,
        ..Default::default()
    }
}

fn parallel() -> BatchConfig {
    BatchConfig {
        parallelism: Parallelism::Available,
        ..Default::default()
    }
}

// Benchmark: full registration of the generated bundle
fn bench_register(c: &mut Criterion) {
    let provider = generated_bundle();
    let mut group = c.benchmark_group("register");
    for (name, batching) in [("sequential", BatchConfig::sequential()), ("parallel", parallel())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &batching, |b, batching| {
            b.iter(|| {
                let mut context = DocumentationContext::new(config(batching.clone()));
                context.register(&provider).unwrap();
                context.graph().len()
            });
        });
    }
    group.finish();
}

// Benchmark: the link pass over an already registered bundle
fn bench_resolve_links(c: &mut Criterion) {
    let mut context = DocumentationContext::new(config(BatchConfig::sequential()));
    context.register(&generated_bundle()).unwrap();
    let pages = context.graph().references();

    let mut group = c.benchmark_group("resolve_links");
    for (name, batching) in [("sequential", BatchConfig::sequential()), ("parallel", parallel())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &batching, |b, batching| {
            b.iter(|| {
                let resolver = context.resolver();
                resolve_links(&resolver, &pages, batching, None)
                    .unwrap()
                    .len()
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_register, bench_resolve_links
}

criterion_main!(benches);
