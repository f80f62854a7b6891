use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use tempfile::TempDir;

use invariant_codes::syntax::parse_program;
use invariant_codes::{CodeAllocator, Config, Pipeline, RunOptions, Transformer};

/// Generate a module with `sites` diagnostic call sites among ordinary code
fn generate_module(index: usize, sites: usize) -> String {
    let mut out = format!("// module {index}\nimport {{ invariant, InvariantError }} from './invariant.js';\n\n");
    for i in 0..sites {
        let body = match i % 4 {
            0 => format!("  invariant(typeof value === 'number', 'Expected a number in {index}.{i}');\n"),
            1 => format!("  if (value < 0) invariant.warn(`Negative value ${{value}} in {index}.{i}`);\n"),
            2 => format!("  if (!value) throw new InvariantError('Missing value in {index}.{i}');\n"),
            _ => format!("  const scaled = value * {i} + offset({i});\n  console.log(scaled);\n"),
        };
        out.push_str(&format!("export function check_{i}(value) {{\n{body}  return value;\n}}\n\n"));
    }
    out
}

fn bench_transform(c: &mut Criterion) {
    let transformer = Transformer::new(&Config::default()).unwrap();
    let mut group = c.benchmark_group("transform");

    for sites in [10, 100, 500] {
        let source = generate_module(0, sites);
        group.bench_with_input(BenchmarkId::new("parse", sites), &source, |b, source| {
            b.iter(|| parse_program(black_box(source)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("rewrite", sites), &source, |b, source| {
            b.iter(|| {
                let mut allocator = CodeAllocator::new();
                transformer
                    .transform("bench.js", black_box(source), &mut allocator)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for files in [10, 50] {
        let modules: Vec<String> = (0..files).map(|i| generate_module(i, 40)).collect();
        for jobs in [1, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("dry_run_jobs_{jobs}"), files),
                &modules,
                |b, modules| {
                    let temp_dir = TempDir::new().unwrap();
                    fs::write(temp_dir.path().join("package.json"), r#"{"name":"bench","version":"1.0.0"}"#)
                        .unwrap();
                    let dist = temp_dir.path().join("dist");
                    fs::create_dir_all(&dist).unwrap();
                    for (i, module) in modules.iter().enumerate() {
                        fs::write(dist.join(format!("module_{i:03}.js")), module).unwrap();
                    }

                    let pipeline = Pipeline::new(Config::default()).unwrap();
                    let options = RunOptions::new(temp_dir.path()).jobs(jobs).dry_run(true);
                    b.iter(|| pipeline.run(black_box(&options)).unwrap())
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_transform, bench_pipeline);
criterion_main!(benches);
